//! Crate for managing the code-generation backends.
//!
//! The [`Backend`](trait.Backend.html) trait exposes the interface for
//! defining new backends: a capability set of optional hooks plus the
//! `is_asynchronous` flag that selects which lifecycle the dispatch engine
//! runs for it. The list of supported backends can be found in the source of
//! this crate.
//!
//! The entry point of this crate is
//! [`BackendManager`](struct.BackendManager.html), a struct that maps
//! target-language tags to backend instances. A trait object is used to keep
//! track of the backend; instances are constructed at most once per canonical
//! name and reused, so repeated lookups return the same instance.

#![deny(missing_docs)]

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

mod backend;
pub mod backends;

pub use backend::{
    route_type, Backend, Hook, InterfaceScope, ParamScope, ShutdownArgs, StartupArgs, TypeEvent,
    TypeTables,
};

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};

lazy_static! {
    /// Map from tool-specific language tags to the canonical backend whose
    /// generated code they rely on. The GUI and hardware targets all need the
    /// native C codecs, so their entries in the main dispatch loop are served
    /// by the C backend; their own backends run in the dual-target pass.
    static ref ALIASES: HashMap<&'static str, &'static str> = {
        let mut aliases = HashMap::new();
        aliases.insert("gui_ri", "c");
        aliases.insert("gui_pi", "c");
        aliases.insert("vhdl", "c");
        aliases.insert("rhapsody", "c");
        aliases
    };
}

/// The canonical backend name serving the given target-language tag.
pub fn canonical_name(language: &str) -> String {
    let lower = language.to_lowercase();
    match ALIASES.get(lower.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => lower,
    }
}

/// The ordered backend names of the GUI pair. Order is significant and fixed:
/// every call of the replayed dual-target sequence hits the backends in this
/// order.
pub const GUI_BACKENDS: &[&str] = &["python", "pyside"];

/// The ordered backend names of the hardware-description target.
pub const VHDL_BACKENDS: &[&str] = &["vhdl"];

/// The ordered backend names of a dual-target language, or `None` if the
/// language is a plain single-backend target.
pub fn dual_target_names(language: &str) -> Option<&'static [&'static str]> {
    match language.to_lowercase().as_str() {
        "gui_ri" | "gui_pi" => Some(GUI_BACKENDS),
        "vhdl" => Some(VHDL_BACKENDS),
        _ => None,
    }
}

/// Manager of the known backends, mapping target-language tags to
/// [`Backend`](trait.Backend.html) instances.
///
/// Each backend is loaded at most once per canonical name and cached for the
/// lifetime of the manager, which is the lifetime of the run: the manager
/// lives inside the run's dispatch context, not in a process-wide global.
/// Reloading a cached backend is idempotent and does not repeat the version
/// logging of the first load.
pub struct BackendManager {
    /// All the backends this manager can serve.
    known: Vec<Arc<dyn Backend>>,
    /// The backends loaded so far, keyed by canonical name.
    loaded: HashMap<String, Arc<dyn Backend>>,
}

impl BackendManager {
    /// Make a new `BackendManager` with all the known backends.
    pub fn new() -> BackendManager {
        BackendManager::with_backends(vec![
            Arc::new(backends::c::CBackend::new()),
            Arc::new(backends::ada::AdaBackend::new()),
            Arc::new(backends::sdl::SdlBackend::new()),
            Arc::new(backends::python::PythonBackend::new()),
            Arc::new(backends::pyside::PysideBackend::new()),
            Arc::new(backends::vhdl::VhdlBackend::new()),
        ])
    }

    /// Make a manager serving an explicit backend set. Used by the tests to
    /// inject recording backends.
    pub fn with_backends(known: Vec<Arc<dyn Backend>>) -> BackendManager {
        BackendManager {
            known,
            loaded: HashMap::new(),
        }
    }

    /// The backend serving the given target-language tag, loading it on first
    /// use. An unknown tag is a fatal configuration error.
    pub fn from_language(&mut self, language: &str) -> Result<Arc<dyn Backend>> {
        self.load(&canonical_name(language))
    }

    /// The backend with the given canonical name, without aliasing. Used by
    /// the dual-target orchestrator, whose backend lists are already
    /// canonical.
    pub fn from_name(&mut self, name: &str) -> Result<Arc<dyn Backend>> {
        self.load(name)
    }

    fn load(&mut self, canonical: &str) -> Result<Arc<dyn Backend>> {
        if let Some(backend) = self.loaded.get(canonical) {
            return Ok(backend.clone());
        }
        let Some(backend) = self
            .known
            .iter()
            .find(|backend| backend.name() == canonical)
            .cloned()
        else {
            bail!("Failed to load backend ({})", canonical);
        };
        debug!("Backend {}: {}", canonical, backend.version());
        self.loaded.insert(canonical.to_string(), backend.clone());
        Ok(backend)
    }
}

impl Default for BackendManager {
    fn default() -> Self {
        BackendManager::new()
    }
}
