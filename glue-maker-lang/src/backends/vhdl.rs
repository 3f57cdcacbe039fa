use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::backends::clean_name;
use crate::{Backend, Hook, ShutdownArgs, StartupArgs, TypeEvent};

#[derive(Debug)]
struct OpenScope {
    entity: String,
    body: String,
}

#[derive(Debug, Default)]
struct State {
    output_dir: PathBuf,
    scope: Option<OpenScope>,
    /// Entities generated so far, wired into the register map by `on_final`.
    entities: Vec<String>,
}

/// Backend for the hardware-description target: one bridge entity per catalog
/// entry, plus the register map written once by `on_final`.
#[derive(Debug, Default)]
pub struct VhdlBackend {
    state: Mutex<State>,
}

impl VhdlBackend {
    /// Make a new `VhdlBackend`.
    pub fn new() -> VhdlBackend {
        Default::default()
    }

    fn emit(&self, event: &TypeEvent, width: &str) -> Result<()> {
        let param = event
            .param
            .context("The vhdl backend only receives parameter-scoped calls")?;
        let mut state = self.state.lock().unwrap();
        let scope = state
            .scope
            .as_mut()
            .context("The vhdl backend received a type before on_startup")?;
        let _ = writeln!(
            scope.body,
            "        {} : in std_logic_vector({}); -- {}",
            clean_name(&param.param.id),
            width,
            event.type_name
        );
        Ok(())
    }
}

impl Backend for VhdlBackend {
    fn name(&self) -> &'static str {
        "vhdl"
    }

    fn is_asynchronous(&self) -> bool {
        false
    }

    fn version(&self) -> &'static str {
        "vhdl bridge generator 3.2"
    }

    fn implements(&self, _hook: Hook) -> bool {
        true
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        let scope = args
            .scope
            .context("The vhdl backend needs an interface scope")?;
        let entity = format!(
            "{}_{}_bridge",
            clean_name(&scope.interface.id),
            clean_name(scope.implementation)
        );
        let mut body = String::new();
        let _ = writeln!(body, "library ieee;\nuse ieee.std_logic_1164.all;\n");
        let _ = writeln!(body, "entity {} is", entity);
        let _ = writeln!(body, "    port (");
        let mut state = self.state.lock().unwrap();
        state.output_dir = args.output_dir.to_path_buf();
        state.scope = Some(OpenScope { entity, body });
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "63 downto 0")
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "511 downto 0")
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "511 downto 0")
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "511 downto 0")
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "1023 downto 0")
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "1023 downto 0")
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, "31 downto 0")
    }

    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut scope = state
            .scope
            .take()
            .context("The vhdl backend shut down before on_startup")?;
        let _ = writeln!(scope.body, "        clk : in std_logic");
        let _ = writeln!(scope.body, "    );");
        let _ = writeln!(scope.body, "end entity {};", scope.entity);
        let path = state.output_dir.join(format!("{}.vhd", scope.entity));
        std::fs::write(&path, scope.body)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        state.entities.push(scope.entity);
        Ok(())
    }

    fn on_final(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        let mut body = String::new();
        let _ = writeln!(body, "-- Register map of the generated bridges");
        for (slot, entity) in state.entities.iter().enumerate() {
            let _ = writeln!(body, "-- slot {}: {}", slot, entity);
        }
        let path = state.output_dir.join("glue_register_map.vhd");
        std::fs::write(&path, body)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use speculoos::prelude::*;

    use glue_maker_model::{Interface, Parameter, SignalRef};

    use super::*;
    use crate::InterfaceScope;

    #[test]
    fn test_final_writes_register_map() {
        let dir = tempfile::tempdir().unwrap();
        let backend = VhdlBackend::new();
        let interface = Interface {
            id: "sampler".into(),
            params: vec![Parameter {
                id: "x".into(),
                signal: SignalRef::Named("pos".into()),
            }],
        };
        let scope = InterfaceScope {
            interface: &interface,
            implementation: "fpga",
        };
        backend
            .on_startup(&StartupArgs {
                language: "vhdl",
                registry_file: Path::new("dataview.yaml"),
                output_dir: dir.path(),
                fv_name: None,
                use_external_codecs: false,
                scope: Some(scope),
            })
            .unwrap();
        backend
            .on_shutdown(&ShutdownArgs {
                language: "vhdl",
                registry_file: Path::new("dataview.yaml"),
                fv_name: None,
                scope: Some(scope),
            })
            .unwrap();
        backend.on_final().unwrap();

        let map = std::fs::read_to_string(dir.path().join("glue_register_map.vhd")).unwrap();
        assert_that!(map.as_str()).contains("slot 0: sampler_fpga_bridge");
        assert_that!(dir.path().join("sampler_fpga_bridge.vhd").is_file()).is_true();
    }
}
