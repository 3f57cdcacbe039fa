use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use glue_maker_model::LeafKind;

use crate::backends::clean_name;
use crate::{Backend, Hook, ShutdownArgs, StartupArgs, TypeEvent};

/// Collection state of the run: every distinct type offered so far.
#[derive(Debug, Default)]
struct Collected {
    output_dir: PathBuf,
    /// Distinct type names with their kinds, in discovery order.
    types: Vec<(String, LeafKind)>,
    seen: HashSet<String>,
}

/// Backend for hand-written Ada code.
///
/// Asynchronous: it is offered every type in scope on every pass and collects
/// the distinct ones, then generates one standalone encoder/decoder pair per
/// collected type when the whole catalog has been traversed. Deduplication of
/// the repeated offers is this backend's responsibility.
#[derive(Debug, Default)]
pub struct AdaBackend {
    state: Mutex<Option<Collected>>,
}

impl AdaBackend {
    /// Make a new `AdaBackend`.
    pub fn new() -> AdaBackend {
        Default::default()
    }

    fn collect(&self, event: &TypeEvent) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = guard
            .as_mut()
            .context("The ada backend received a type before on_startup")?;
        if state.seen.insert(event.type_name.to_string()) {
            state
                .types
                .push((event.type_name.to_string(), event.def.leaf));
        }
        Ok(())
    }
}

impl Backend for AdaBackend {
    fn name(&self) -> &'static str {
        "ada"
    }

    fn is_asynchronous(&self) -> bool {
        true
    }

    fn version(&self) -> &'static str {
        "ada glue generator 3.2"
    }

    fn implements(&self, hook: Hook) -> bool {
        !matches!(hook, Hook::Final)
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        if guard.is_none() {
            *guard = Some(Collected {
                output_dir: args.output_dir.to_path_buf(),
                ..Default::default()
            });
        }
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.collect(event)
    }

    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        let state = self
            .state
            .lock()
            .unwrap()
            .take()
            .context("The ada backend shut down before on_startup")?;
        let mut body = String::new();
        let _ = writeln!(body, "package Glue_Codecs is");
        for (name, leaf) in &state.types {
            let ident = clean_name(name);
            let _ = writeln!(body, "\n   --  {} ({})", name, leaf);
            let _ = writeln!(
                body,
                "   procedure Encode_{} (Value : asn1Scc{}; Buffer : out Bit_Stream);",
                ident, ident
            );
            let _ = writeln!(
                body,
                "   procedure Decode_{} (Buffer : Bit_Stream; Value : out asn1Scc{});",
                ident, ident
            );
        }
        let _ = writeln!(body, "\nend Glue_Codecs;");
        let path = state.output_dir.join("glue_codecs.ads");
        std::fs::write(&path, body)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }
}
