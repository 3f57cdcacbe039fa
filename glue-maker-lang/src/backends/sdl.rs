use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use glue_maker_model::{write_grammar, StructuralType};

use crate::{Backend, Hook, ShutdownArgs, StartupArgs, TypeEvent};

#[derive(Debug, Default)]
struct Collected {
    output_dir: PathBuf,
    /// The declaration-ordered types of the registry file in scope, captured
    /// on the first offer.
    types: Option<Vec<StructuralType>>,
}

/// Backend for SDL modeling tools.
///
/// Asynchronous: it does not emit per-parameter glue at all. It captures the
/// type table it is offered and re-publishes the data view of the system as an
/// SDL-consumable grammar when the catalog has been traversed.
#[derive(Debug, Default)]
pub struct SdlBackend {
    state: Mutex<Option<Collected>>,
}

impl SdlBackend {
    /// Make a new `SdlBackend`.
    pub fn new() -> SdlBackend {
        Default::default()
    }

    fn capture(&self, event: &TypeEvent) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = guard
            .as_mut()
            .context("The sdl backend received a type before on_startup")?;
        if state.types.is_none() {
            state.types = Some(event.tables.types.to_vec());
        }
        Ok(())
    }
}

impl Backend for SdlBackend {
    fn name(&self) -> &'static str {
        "sdl"
    }

    fn is_asynchronous(&self) -> bool {
        true
    }

    fn version(&self) -> &'static str {
        "sdl data view publisher 3.2"
    }

    fn implements(&self, hook: Hook) -> bool {
        !matches!(hook, Hook::Final)
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        if guard.is_none() {
            *guard = Some(Collected {
                output_dir: args.output_dir.to_path_buf(),
                types: None,
            });
        }
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.capture(event)
    }

    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        let state = self
            .state
            .lock()
            .unwrap()
            .take()
            .context("The sdl backend shut down before on_startup")?;
        let path = state.output_dir.join("DataView.pr");
        let mut out = Vec::new();
        write_grammar(&mut out, state.types.as_deref().unwrap_or(&[]))
            .context("Cannot render the data view grammar")?;
        std::fs::write(&path, out)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }
}
