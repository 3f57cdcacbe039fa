use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

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
    /// Widget classes generated so far, mounted in the main window by
    /// `on_final`.
    widgets: Vec<String>,
}

/// Second backend of the GUI pair: the widget classes rendering each
/// interface. It receives exactly the same call sequence as the python
/// backend, one step behind it in the fixed backend order.
#[derive(Debug, Default)]
pub struct PysideBackend {
    state: Mutex<State>,
}

impl PysideBackend {
    /// Make a new `PysideBackend`.
    pub fn new() -> PysideBackend {
        Default::default()
    }

    fn emit(&self, event: &TypeEvent, widget: &str) -> Result<()> {
        let param = event
            .param
            .context("The pyside backend only receives parameter-scoped calls")?;
        let mut state = self.state.lock().unwrap();
        let scope = state
            .scope
            .as_mut()
            .context("The pyside backend received a type before on_startup")?;
        let _ = writeln!(
            scope.body,
            "        self.{} = {}(title=\"{}\")  # {}",
            clean_name(&param.param.id),
            widget,
            param.param.id,
            event.type_name
        );
        Ok(())
    }
}

impl Backend for PysideBackend {
    fn name(&self) -> &'static str {
        "pyside"
    }

    fn is_asynchronous(&self) -> bool {
        false
    }

    fn version(&self) -> &'static str {
        "pyside gui widgets 3.2"
    }

    fn implements(&self, _hook: Hook) -> bool {
        true
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        let scope = args
            .scope
            .context("The pyside backend needs an interface scope")?;
        let class = format!(
            "{}{}Page",
            clean_name(&scope.interface.id),
            clean_name(scope.implementation)
        );
        let module = format!(
            "{}_{}_widgets",
            clean_name(&scope.interface.id),
            clean_name(scope.implementation)
        );
        let mut body = String::new();
        let _ = writeln!(body, "from PySide6.QtWidgets import QWidget\n");
        let _ = writeln!(body, "class {}(QWidget):", class);
        let _ = writeln!(body, "    def __init__(self):");
        let _ = writeln!(body, "        super().__init__()");
        let mut state = self.state.lock().unwrap();
        state.output_dir = args.output_dir.to_path_buf();
        state.scope = Some(OpenScope { module, body });
        state.widgets.push(class);
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "ScalarField")
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "RecordGroup")
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "RecordGroup")
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "VariantSelector")
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "ArrayView")
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "ArrayView")
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "EnumPicker")
    }

    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let scope = state
            .scope
            .take()
            .context("The pyside backend shut down before on_startup")?;
        let path = state.output_dir.join(format!("{}.py", scope.module));
        std::fs::write(&path, scope.body)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }

    fn on_final(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        let mut body = String::new();
        let _ = writeln!(body, "# Main window mounting every generated page");
        for widget in &state.widgets {
            let _ = writeln!(body, "window.add_page({}())", widget);
        }
        let path = state.output_dir.join("gui_main_window.py");
        std::fs::write(&path, body)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }
}
