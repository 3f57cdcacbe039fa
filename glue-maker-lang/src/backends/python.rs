use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::backends::clean_name;
use crate::{Backend, Hook, ShutdownArgs, StartupArgs, TypeEvent};

#[derive(Debug)]
struct OpenScope {
    module: String,
    body: String,
}

#[derive(Debug, Default)]
struct State {
    output_dir: PathBuf,
    scope: Option<OpenScope>,
    /// The modules generated so far, finalized into the index by `on_final`.
    modules: Vec<String>,
}

/// First backend of the GUI pair: the Python-side accessors the GUI widgets
/// call into. One module per catalog entry, plus an index module written once
/// by `on_final` after every GUI entry has been processed.
#[derive(Debug, Default)]
pub struct PythonBackend {
    state: Mutex<State>,
}

impl PythonBackend {
    /// Make a new `PythonBackend`.
    pub fn new() -> PythonBackend {
        Default::default()
    }

    fn emit(&self, event: &TypeEvent, accessor: &str) -> Result<()> {
        let param = event
            .param
            .context("The python backend only receives parameter-scoped calls")?;
        let mut state = self.state.lock().unwrap();
        let scope = state
            .scope
            .as_mut()
            .context("The python backend received a type before on_startup")?;
        let _ = writeln!(
            scope.body,
            "\ndef get_{}():\n    \"\"\"{}: {}\"\"\"\n    return {}",
            clean_name(&param.param.id),
            event.type_name,
            event.def.leaf,
            accessor
        );
        Ok(())
    }
}

impl Backend for PythonBackend {
    fn name(&self) -> &'static str {
        "python"
    }

    fn is_asynchronous(&self) -> bool {
        false
    }

    fn version(&self) -> &'static str {
        "python gui accessors 3.2"
    }

    fn implements(&self, _hook: Hook) -> bool {
        true
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        let scope = args
            .scope
            .context("The python backend needs an interface scope")?;
        let module = format!(
            "{}_{}_gui",
            clean_name(&scope.interface.id),
            clean_name(scope.implementation)
        );
        let mut body = String::new();
        let _ = writeln!(
            body,
            "# Accessors for {}.{} ({})",
            scope.interface.id, scope.implementation, args.language
        );
        let _ = writeln!(body, "import ctypes");
        let mut state = self.state.lock().unwrap();
        state.output_dir = args.output_dir.to_path_buf();
        state.scope = Some(OpenScope { module, body });
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_scalar()")
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_record()")
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_record()")
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_variant()")
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_array()")
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_array()")
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "_read_scalar()")
    }

    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let scope = state
            .scope
            .take()
            .context("The python backend shut down before on_startup")?;
        let path = state.output_dir.join(format!("{}.py", scope.module));
        std::fs::write(&path, scope.body)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        state.modules.push(scope.module);
        Ok(())
    }

    fn on_final(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        let imports = state
            .modules
            .iter()
            .map(|module| format!("import {}", module))
            .join("\n");
        let path = state.output_dir.join("gui_index.py");
        std::fs::write(&path, format!("# GUI module index\n{}\n", imports))
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }
}
