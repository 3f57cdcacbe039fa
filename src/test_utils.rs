//! Test doubles and fixtures shared by the dispatch tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use glue_maker_lang::{Backend, Hook, ShutdownArgs, StartupArgs, TypeEvent};
use glue_maker_model::{
    CatalogEntry, Interface, LeafKind, Parameter, RegistryFile, Signal, SignalRef,
    StructuralType, SystemDescription, TypeRegistry,
};

use crate::dispatch::DispatchOptions;

/// Shared log of every hook invocation, in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Make a new empty call log.
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A backend that records every call it receives into a shared log.
#[derive(Debug)]
pub struct RecordingBackend {
    name: &'static str,
    asynchronous: bool,
    /// The hooks this backend declares. Empty means all of them.
    hooks: Vec<Hook>,
    log: CallLog,
}

impl RecordingBackend {
    pub fn new(name: &'static str, asynchronous: bool, log: CallLog) -> RecordingBackend {
        RecordingBackend {
            name,
            asynchronous,
            hooks: Vec::new(),
            log,
        }
    }

    pub fn with_hooks(
        name: &'static str,
        asynchronous: bool,
        hooks: Vec<Hook>,
        log: CallLog,
    ) -> RecordingBackend {
        RecordingBackend {
            name,
            asynchronous,
            hooks,
            log,
        }
    }

    fn record(&self, what: String) {
        self.log.lock().unwrap().push(what);
    }

    fn record_type(&self, hook: Hook, event: &TypeEvent) -> Result<()> {
        self.record(format!("{}:{}:{}", self.name, hook, event.type_name));
        Ok(())
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }

    fn implements(&self, hook: Hook) -> bool {
        self.hooks.is_empty() || self.hooks.contains(&hook)
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        self.record(format!("{}:on_startup:{}", self.name, args.language));
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::Basic, event)
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::Sequence, event)
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::Set, event)
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::Choice, event)
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::SequenceOf, event)
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::SetOf, event)
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.record_type(Hook::Enumerated, event)
    }

    fn on_shutdown(&self, args: &ShutdownArgs) -> Result<()> {
        self.record(format!("{}:on_shutdown:{}", self.name, args.language));
        Ok(())
    }

    fn on_final(&self) -> Result<()> {
        self.record(format!("{}:on_final", self.name));
        Ok(())
    }
}

/// A plain structural type with no members.
pub fn simple_type(name: &str, leaf: LeafKind) -> StructuralType {
    StructuralType {
        name: name.into(),
        leaf,
        members: vec![],
        contained: None,
        artificial: false,
        size: None,
    }
}

/// A registry with a single file, `dataview.yaml`, holding the given types.
pub fn one_file_registry(types: Vec<StructuralType>) -> TypeRegistry {
    let mut registry = TypeRegistry::default();
    registry
        .add(RegistryFile {
            file: PathBuf::from("dataview.yaml"),
            types,
        })
        .unwrap();
    registry
}

/// A parameter already resolved against `dataview.yaml`.
pub fn resolved_param(id: &str, type_name: &str) -> Parameter {
    Parameter {
        id: id.into(),
        signal: SignalRef::Resolved(Signal {
            file: PathBuf::from("dataview.yaml"),
            type_name: type_name.into(),
            size: None,
        }),
    }
}

/// An interface with the given resolved parameters.
pub fn interface(id: &str, params: Vec<Parameter>) -> Interface {
    Interface {
        id: id.into(),
        params,
    }
}

/// A catalog entry for the given interface and language.
pub fn entry(interface: &str, implementation: &str, language: Option<&str>) -> CatalogEntry {
    CatalogEntry {
        interface: interface.into(),
        implementation: implementation.into(),
        language: language.map(String::from),
        fv_name: None,
        kind: Default::default(),
    }
}

/// A system description from its parts.
pub fn system(interfaces: Vec<Interface>, implementations: Vec<CatalogEntry>) -> SystemDescription {
    SystemDescription {
        signals: vec![],
        interfaces,
        implementations,
    }
}

/// Dispatch options pointing at a throwaway output directory. The recording
/// backends never write files, so the directory does not need to exist.
pub fn options() -> DispatchOptions {
    DispatchOptions {
        output_dir: PathBuf::from("."),
        use_external_codecs: false,
        prune_artificial_members: false,
    }
}
