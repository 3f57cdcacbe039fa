use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{bail, ensure, Result};

use glue_maker_model::{Interface, LeafKind, Parameter, StructuralType};

/// One of the hooks a backend may implement.
///
/// Capability checks are presence checks over this set: before invoking a hook
/// the engine asks the backend whether it implements it, and a required hook
/// that is missing is a fatal configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Opens the generation scope.
    Startup,
    /// Closes the generation scope.
    Shutdown,
    /// Shared hook of the four primitive kinds.
    Basic,
    /// SEQUENCE hook.
    Sequence,
    /// SET hook.
    Set,
    /// CHOICE hook.
    Choice,
    /// SEQUENCE OF hook.
    SequenceOf,
    /// SET OF hook.
    SetOf,
    /// ENUMERATED hook.
    Enumerated,
    /// Closing hook of dual-target backends, fired once per run.
    Final,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Hook::Startup => "on_startup",
            Hook::Shutdown => "on_shutdown",
            Hook::Basic => "on_basic",
            Hook::Sequence => "on_sequence",
            Hook::Set => "on_set",
            Hook::Choice => "on_choice",
            Hook::SequenceOf => "on_sequence_of",
            Hook::SetOf => "on_set_of",
            Hook::Enumerated => "on_enumerated",
            Hook::Final => "on_final",
        };
        write!(f, "{}", name)
    }
}

/// The interface and implementation a synchronous call belongs to.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceScope<'a> {
    /// The interface being processed.
    pub interface: &'a Interface,
    /// Id of the implementation of the catalog entry.
    pub implementation: &'a str,
}

/// Arguments of the `on_startup` hook.
#[derive(Debug, Clone, Copy)]
pub struct StartupArgs<'a> {
    /// Target language tag that selected the backend (before aliasing).
    pub language: &'a str,
    /// Registry file the processed parameters draw their types from.
    pub registry_file: &'a Path,
    /// Directory the generated sources are written to.
    pub output_dir: &'a Path,
    /// Verification name of the catalog entry, when one is bound.
    pub fv_name: Option<&'a str>,
    /// Whether the run relies on externally generated codecs.
    pub use_external_codecs: bool,
    /// The owning interface and implementation. `None` for asynchronous
    /// startups: those backends collect types globally, not per interface.
    pub scope: Option<InterfaceScope<'a>>,
}

/// Arguments of the `on_shutdown` hook.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownArgs<'a> {
    /// Target language tag that selected the backend.
    pub language: &'a str,
    /// Registry file the shut-down scope drew its types from.
    pub registry_file: &'a Path,
    /// Verification name of the catalog entry, when one is bound.
    pub fv_name: Option<&'a str>,
    /// The owning interface and implementation, for synchronous shutdowns.
    pub scope: Option<InterfaceScope<'a>>,
}

/// The name tables every type hook receives.
#[derive(Debug, Clone, Copy)]
pub struct TypeTables<'a> {
    /// The declaration-ordered types of the registry file in scope.
    pub types: &'a [StructuralType],
    /// The global name to leaf classification table.
    pub leaf_kinds: &'a HashMap<String, LeafKind>,
}

/// The parameter context attached to synchronous type events.
#[derive(Debug, Clone, Copy)]
pub struct ParamScope<'a> {
    /// The owning interface and implementation.
    pub scope: InterfaceScope<'a>,
    /// The parameter whose bound type is being routed.
    pub param: &'a Parameter,
    /// Verification name of the catalog entry.
    pub fv_name: Option<&'a str>,
}

/// One structural type offered to a type hook.
#[derive(Debug, Clone, Copy)]
pub struct TypeEvent<'a> {
    /// Name of the type (always equal to `def.name`).
    pub type_name: &'a str,
    /// The type definition.
    pub def: &'a StructuralType,
    /// The name tables of the registry file in scope.
    pub tables: TypeTables<'a>,
    /// The owning parameter. `None` for asynchronous offers, which carry only
    /// type-level context.
    pub param: Option<ParamScope<'a>>,
}

/// Trait that defines the capability set of the code-generation backends.
///
/// Every hook has a no-op default implementation, and `implements` declares
/// which hooks the backend really provides. Not all of them are _really_
/// optional: the dispatch engine treats a hook that a routed type requires but
/// the backend does not declare as a fatal configuration error, naming the
/// hook and the backend.
///
/// Backends are shared as `Arc<dyn Backend>` and invoked through `&self`;
/// state carried across calls (per-interface buffers, collected type sets)
/// lives behind interior mutability.
pub trait Backend: fmt::Debug + Send + Sync {
    /// Canonical name of the backend. This must be unique between all the
    /// known backends.
    fn name(&self) -> &'static str;

    /// Whether this backend follows the asynchronous lifecycle (one
    /// startup/shutdown per run, collecting every type in scope) instead of
    /// the synchronous one (one full cycle per catalog entry).
    fn is_asynchronous(&self) -> bool;

    /// Version string, logged the first time the backend is loaded.
    fn version(&self) -> &'static str {
        "unversioned"
    }

    /// Whether this backend implements the given hook.
    fn implements(&self, hook: Hook) -> bool;

    /// Open the generation scope.
    fn on_startup(&self, _args: &StartupArgs) -> Result<()> {
        Ok(())
    }

    /// Route a primitive type (BOOLEAN, INTEGER, REAL, OCTET STRING).
    fn on_basic(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Route a SEQUENCE type.
    fn on_sequence(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Route a SET type.
    fn on_set(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Route a CHOICE type.
    fn on_choice(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Route a SEQUENCE OF type.
    fn on_sequence_of(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Route a SET OF type.
    fn on_set_of(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Route an ENUMERATED type.
    fn on_enumerated(&self, _event: &TypeEvent) -> Result<()> {
        Ok(())
    }

    /// Close the generation scope.
    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        Ok(())
    }

    /// Closing hook of dual-target backends, called once after the whole
    /// catalog has been traversed, and only if the target was used.
    fn on_final(&self) -> Result<()> {
        Ok(())
    }
}

/// Route one structural type to the backend hook matching its leaf
/// classification.
///
/// This is the single routing algorithm shared by both lifecycles and by the
/// dual-target orchestrator: primitives require `on_basic`, each structured
/// kind requires its own hook, anything else is an invariant violation.
pub fn route_type(backend: &dyn Backend, event: &TypeEvent) -> Result<()> {
    let require = |hook: Hook| -> Result<()> {
        ensure!(
            backend.implements(hook),
            "Registry contains {} but backend {} provides no {} hook",
            event.type_name,
            backend.name(),
            hook
        );
        Ok(())
    };
    match event.def.leaf {
        kind if kind.is_primitive() => {
            require(Hook::Basic)?;
            backend.on_basic(event)
        }
        LeafKind::Sequence => {
            require(Hook::Sequence)?;
            backend.on_sequence(event)
        }
        LeafKind::Set => {
            require(Hook::Set)?;
            backend.on_set(event)
        }
        LeafKind::Choice => {
            require(Hook::Choice)?;
            backend.on_choice(event)
        }
        LeafKind::SequenceOf => {
            require(Hook::SequenceOf)?;
            backend.on_sequence_of(event)
        }
        LeafKind::SetOf => {
            require(Hook::SetOf)?;
            backend.on_set_of(event)
        }
        LeafKind::Enumerated => {
            require(Hook::Enumerated)?;
            backend.on_enumerated(event)
        }
        kind => bail!(
            "Unexpected type of element: {} ({} in the registry)",
            kind,
            event.type_name
        ),
    }
}
