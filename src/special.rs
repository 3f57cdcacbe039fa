use std::sync::Arc;

use anyhow::{bail, Context, Result};

use glue_maker_lang::{
    dual_target_names, route_type, Backend, InterfaceScope, ParamScope, ShutdownArgs, StartupArgs,
    TypeEvent, TypeTables, GUI_BACKENDS, VHDL_BACKENDS,
};
use glue_maker_model::{SystemDescription, TypeRegistry};

use crate::catalog::Catalog;
use crate::dispatch::DispatchContext;

/// Run the dual-target pass over the catalog.
///
/// Dual-target languages (the GUI pair, the hardware-description target) need
/// several cooperating backends to receive an identical call sequence: startup
/// on every backend in the fixed order, then each parameter's bound type on
/// every backend in order, then shutdown on every backend in order. After the
/// whole catalog, `on_final` fires once per backend of each target that was
/// actually used.
///
/// This pass runs *in addition to* the main dispatch loop: in the main loop
/// these entries are served by the shared native backend their generated code
/// links against.
pub fn dispatch_special(
    ctx: &mut DispatchContext,
    catalog: &Catalog,
    system: &SystemDescription,
    registry: &TypeRegistry,
) -> Result<()> {
    let mut worked_on_gui = false;
    let mut worked_on_vhdl = false;

    for entry in &catalog.entries {
        let Some(language) = &entry.language else {
            continue;
        };
        let Some(names) = dual_target_names(language) else {
            continue;
        };
        let interface = system.interface(&entry.interface).with_context(|| {
            format!("Catalog entry references the unknown interface {}", entry.interface)
        })?;
        if interface.params.is_empty() {
            // the zero-parameter policy check already ran at catalog time
            continue;
        }
        let gui = language.to_lowercase() != "vhdl";
        if gui {
            worked_on_gui = true;
        } else {
            worked_on_vhdl = true;
        }
        info!(
            "Creating {} glue for {}.{}",
            language.to_uppercase(),
            entry.interface,
            entry.implementation
        );

        let backends = load_all(ctx, names)?;
        let registry_file = interface.params[0].bound_signal()?.file.clone();
        let fv_name = entry.fv_name.as_deref();
        let scope = InterfaceScope {
            interface,
            implementation: &entry.implementation,
        };

        for backend in &backends {
            backend.on_startup(&StartupArgs {
                language,
                registry_file: &registry_file,
                output_dir: &ctx.options.output_dir,
                fv_name,
                use_external_codecs: ctx.options.use_external_codecs,
                scope: Some(scope),
            })?;
        }
        for param in &interface.params {
            debug!("Processing param {}...", param.id);
            let signal = param.bound_signal()?;
            let Some(types) = registry.types_of(&signal.file) else {
                bail!("Registry file {} was never loaded", signal.file.display());
            };
            let Some(def) = types.iter().find(|def| def.name == signal.type_name) else {
                bail!(
                    "Parameter {} of {} resolves to type {} which is not defined in {}",
                    param.id,
                    interface.id,
                    signal.type_name,
                    signal.file.display()
                );
            };
            let event = TypeEvent {
                type_name: &def.name,
                def,
                tables: TypeTables {
                    types,
                    leaf_kinds: registry.leaf_kinds(),
                },
                param: Some(ParamScope {
                    scope,
                    param,
                    fv_name,
                }),
            };
            for backend in &backends {
                route_type(backend.as_ref(), &event)?;
            }
        }
        for backend in &backends {
            backend.on_shutdown(&ShutdownArgs {
                language,
                registry_file: &registry_file,
                fv_name,
                scope: Some(scope),
            })?;
        }
    }

    // close each used target once, in the same fixed backend order
    if worked_on_gui {
        for backend in load_all(ctx, GUI_BACKENDS)? {
            backend.on_final()?;
        }
    }
    if worked_on_vhdl {
        for backend in load_all(ctx, VHDL_BACKENDS)? {
            backend.on_final()?;
        }
    }
    Ok(())
}

fn load_all(ctx: &mut DispatchContext, names: &[&str]) -> Result<Vec<Arc<dyn Backend>>> {
    names
        .iter()
        .map(|name| ctx.backends.from_name(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;

    use glue_maker_lang::BackendManager;
    use glue_maker_model::LeafKind;

    use super::*;
    use crate::catalog::Catalog;
    use crate::test_utils::*;

    fn gui_context(log: &CallLog) -> DispatchContext {
        DispatchContext::new(
            BackendManager::with_backends(vec![
                Arc::new(RecordingBackend::new("python", false, log.clone())),
                Arc::new(RecordingBackend::new("pyside", false, log.clone())),
                Arc::new(RecordingBackend::new("vhdl", false, log.clone())),
            ]),
            options(),
        )
    }

    #[test]
    fn test_gui_pair_receives_identical_sequence_in_order() {
        // one interface with one BOOLEAN parameter: every call hits python
        // first and pyside second, and on_final closes both exactly once
        let log = call_log();
        let mut ctx = gui_context(&log);
        let system = system(
            vec![interface("telecommand", vec![resolved_param("x", "T-Flag")])],
            vec![entry("telecommand", "impl1", Some("gui_ri"))],
        );
        let registry = one_file_registry(vec![simple_type("T-Flag", LeafKind::Boolean)]);
        let catalog = Catalog {
            entries: system.implementations.clone(),
            ..Default::default()
        };

        dispatch_special(&mut ctx, &catalog, &system, &registry).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "python:on_startup:gui_ri".to_string(),
                "pyside:on_startup:gui_ri".to_string(),
                "python:on_basic:T-Flag".to_string(),
                "pyside:on_basic:T-Flag".to_string(),
                "python:on_shutdown:gui_ri".to_string(),
                "pyside:on_shutdown:gui_ri".to_string(),
                "python:on_final".to_string(),
                "pyside:on_final".to_string(),
            ]
        );
    }

    #[test]
    fn test_on_final_fires_once_for_many_entries() {
        let log = call_log();
        let mut ctx = gui_context(&log);
        let system = system(
            vec![
                interface("first", vec![resolved_param("x", "T-Flag")]),
                interface("second", vec![resolved_param("y", "T-Flag")]),
            ],
            vec![
                entry("first", "impl1", Some("gui_ri")),
                entry("second", "impl2", Some("gui_pi")),
            ],
        );
        let registry = one_file_registry(vec![simple_type("T-Flag", LeafKind::Boolean)]);
        let catalog = Catalog {
            entries: system.implementations.clone(),
            ..Default::default()
        };

        dispatch_special(&mut ctx, &catalog, &system, &registry).unwrap();

        let calls = log.lock().unwrap();
        assert_that!(calls.iter().filter(|call| call.ends_with("on_final")).count())
            .is_equal_to(2);
        // and strictly after every per-entry call
        let last_two: Vec<_> = calls.iter().rev().take(2).rev().cloned().collect();
        assert_eq!(
            last_two,
            vec!["python:on_final".to_string(), "pyside:on_final".to_string()]
        );
    }

    #[test]
    fn test_on_final_is_not_called_for_unused_targets() {
        let log = call_log();
        let mut ctx = gui_context(&log);
        let system = system(
            vec![interface("sampler", vec![resolved_param("x", "T-Flag")])],
            vec![entry("sampler", "fpga", Some("vhdl"))],
        );
        let registry = one_file_registry(vec![simple_type("T-Flag", LeafKind::Boolean)]);
        let catalog = Catalog {
            entries: system.implementations.clone(),
            ..Default::default()
        };

        dispatch_special(&mut ctx, &catalog, &system, &registry).unwrap();

        let calls = log.lock().unwrap();
        assert_that!(calls.contains(&"vhdl:on_final".to_string())).is_true();
        assert_that!(calls.contains(&"python:on_final".to_string())).is_false();
        assert_that!(calls.contains(&"pyside:on_final".to_string())).is_false();
    }

    #[test]
    fn test_plain_targets_are_ignored_by_the_special_pass() {
        let log = call_log();
        let mut ctx = gui_context(&log);
        let system = system(
            vec![interface("compute", vec![resolved_param("x", "T-Flag")])],
            vec![entry("compute", "impl1", Some("C"))],
        );
        let registry = one_file_registry(vec![simple_type("T-Flag", LeafKind::Boolean)]);
        let catalog = Catalog {
            entries: system.implementations.clone(),
            ..Default::default()
        };

        dispatch_special(&mut ctx, &catalog, &system, &registry).unwrap();

        assert_that!(*log.lock().unwrap()).is_empty();
    }
}
