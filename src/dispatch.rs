use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use glue_maker_lang::{
    route_type, Backend, BackendManager, Hook, InterfaceScope, ParamScope, ShutdownArgs,
    StartupArgs, TypeEvent, TypeTables,
};
use glue_maker_model::{CatalogEntry, SignalRef, SystemDescription, TypeRegistry};

use crate::catalog::Catalog;

/// Options of a dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Directory where the backends write the generated sources.
    pub output_dir: PathBuf,
    /// Whether the backends should rely on externally generated codecs.
    pub use_external_codecs: bool,
    /// Whether asynchronous backends are withheld the types that are only
    /// reachable through artificial containers.
    pub prune_artificial_members: bool,
}

/// The startup context recorded for a started asynchronous backend, replayed
/// at its deferred shutdown.
#[derive(Debug)]
struct AsyncEntry {
    backend: Arc<dyn Backend>,
    language: String,
    registry_file: PathBuf,
    fv_name: Option<String>,
}

/// The state of one generation run.
///
/// This owns everything that the run mutates while traversing the catalog: the
/// backend cache (inside the manager) and the set of started asynchronous
/// backends. Its lifetime is exactly the run's lifetime.
pub struct DispatchContext {
    /// The manager resolving target languages to backend instances.
    pub backends: BackendManager,
    /// The options of the run.
    pub options: DispatchOptions,
    /// The distinct asynchronous backends started so far, each of which gets
    /// exactly one deferred shutdown.
    async_started: Vec<AsyncEntry>,
}

impl DispatchContext {
    /// Make a new context for one run.
    pub fn new(backends: BackendManager, options: DispatchOptions) -> DispatchContext {
        DispatchContext {
            backends,
            options,
            async_started: Vec::new(),
        }
    }

    /// Run the synchronous and asynchronous lifecycles over the whole catalog,
    /// then shut down every started asynchronous backend exactly once.
    pub fn dispatch(
        &mut self,
        catalog: &Catalog,
        system: &SystemDescription,
        registry: &TypeRegistry,
    ) -> Result<()> {
        let prune = self.pruned_offer_set(system, registry);
        for entry in &catalog.entries {
            self.dispatch_entry(entry, system, registry, prune.as_ref())
                .with_context(|| {
                    format!(
                        "Failed to generate glue for {}.{}",
                        entry.interface, entry.implementation
                    )
                })?;
        }
        self.shutdown_asynchronous()
    }

    /// The set of type names offered to asynchronous backends when the
    /// artificial-member pruning is enabled, `None` otherwise.
    fn pruned_offer_set(
        &self,
        system: &SystemDescription,
        registry: &TypeRegistry,
    ) -> Option<HashSet<String>> {
        if !self.options.prune_artificial_members {
            return None;
        }
        let roots = system
            .interfaces
            .iter()
            .flat_map(|interface| &interface.params)
            .filter_map(|param| match &param.signal {
                SignalRef::Resolved(signal) => Some(signal.type_name.as_str()),
                SignalRef::Named(_) => None,
            });
        Some(registry.reachable_without_artificial(roots))
    }

    fn dispatch_entry(
        &mut self,
        entry: &CatalogEntry,
        system: &SystemDescription,
        registry: &TypeRegistry,
        prune: Option<&HashSet<String>>,
    ) -> Result<()> {
        // No implementation bound: nothing to generate.
        let Some(language) = &entry.language else {
            return Ok(());
        };
        let interface = system.interface(&entry.interface).with_context(|| {
            format!("Catalog entry references the unknown interface {}", entry.interface)
        })?;
        // Avoid generating empty glue for parameterless interfaces.
        if interface.params.is_empty() {
            return Ok(());
        }
        info!(
            "Creating glue for parameters of {}.{}...",
            entry.interface, entry.implementation
        );

        let backend = self.backends.from_language(language).with_context(|| {
            format!("for {}.{}", entry.interface, entry.implementation)
        })?;
        let registry_file = interface.params[0].bound_signal()?.file.clone();
        let fv_name = entry.fv_name.as_deref();
        let scope = InterfaceScope {
            interface,
            implementation: &entry.implementation,
        };

        if backend.is_asynchronous() {
            // Asynchronous backends collect across the whole catalog: startup
            // runs only the first time the backend is encountered, and the
            // shutdown is deferred until the catalog has been traversed.
            let already_started = self
                .async_started
                .iter()
                .any(|started| started.backend.name() == backend.name());
            if !already_started {
                if backend.implements(Hook::Startup) {
                    backend.on_startup(&StartupArgs {
                        language,
                        registry_file: &registry_file,
                        output_dir: &self.options.output_dir,
                        fv_name,
                        use_external_codecs: self.options.use_external_codecs,
                        scope: None,
                    })?;
                }
                self.async_started.push(AsyncEntry {
                    backend: backend.clone(),
                    language: language.clone(),
                    registry_file: registry_file.clone(),
                    fv_name: entry.fv_name.clone(),
                });
            }
        } else if backend.implements(Hook::Startup) {
            backend.on_startup(&StartupArgs {
                language,
                registry_file: &registry_file,
                output_dir: &self.options.output_dir,
                fv_name,
                use_external_codecs: self.options.use_external_codecs,
                scope: Some(scope),
            })?;
        }

        for param in &interface.params {
            debug!("Creating glue for param {}...", param.id);
            let signal = param.bound_signal()?;
            let Some(types) = registry.types_of(&signal.file) else {
                bail!("Registry file {} was never loaded", signal.file.display());
            };
            let tables = TypeTables {
                types,
                leaf_kinds: registry.leaf_kinds(),
            };
            for def in types {
                if !backend.is_asynchronous() && def.name != signal.type_name {
                    // Synchronous backends only see the type bound to the
                    // parameter; asynchronous ones are offered everything and
                    // deduplicate on their side.
                    continue;
                }
                if def.artificial {
                    continue;
                }
                if let Some(keep) = prune {
                    if backend.is_asynchronous() && !keep.contains(&def.name) {
                        continue;
                    }
                }
                let event = TypeEvent {
                    type_name: &def.name,
                    def,
                    tables,
                    param: (!backend.is_asynchronous()).then_some(ParamScope {
                        scope,
                        param,
                        fv_name,
                    }),
                };
                route_type(backend.as_ref(), &event)?;
            }
        }

        if !backend.is_asynchronous() && backend.implements(Hook::Shutdown) {
            backend.on_shutdown(&ShutdownArgs {
                language,
                registry_file: &registry_file,
                fv_name,
                scope: Some(scope),
            })?;
        }
        Ok(())
    }

    /// Shut down every started asynchronous backend, exactly once each, with
    /// the context recorded at its startup.
    fn shutdown_asynchronous(&mut self) -> Result<()> {
        for started in self.async_started.drain(..) {
            if started.backend.implements(Hook::Shutdown) {
                started.backend.on_shutdown(&ShutdownArgs {
                    language: &started.language,
                    registry_file: &started.registry_file,
                    fv_name: started.fv_name.as_deref(),
                    scope: None,
                })?;
            }
        }
        Ok(())
    }
}
