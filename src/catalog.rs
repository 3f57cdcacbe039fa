use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};

use glue_maker_model::{CatalogEntry, ContainerKind, LeafKind, SystemDescription, TypeRegistry};

/// The assembled dispatch catalog: the entries to process plus the registry
/// grouping that drives batched registry loading.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// The catalog entries, in input order. Entries without a bound language
    /// or without parameters are retained here and skipped by the engine.
    pub entries: Vec<CatalogEntry>,
    /// The distinct registry files referenced by any parameter, in discovery
    /// order.
    pub registry_files: Vec<PathBuf>,
    /// Map from registry file to the target languages needing it, each with
    /// the interfaces it is needed for.
    pub by_file: HashMap<PathBuf, HashMap<String, Vec<String>>>,
}

/// Assemble the catalog from the resolved system description.
///
/// Every parameter must already be resolved; an entry referencing an interface
/// that none of the input documents declare is fatal.
pub fn build_catalog(system: &SystemDescription, only_subprograms: bool) -> Result<Catalog> {
    let mut catalog = Catalog::default();

    for entry in &system.implementations {
        if only_subprograms && entry.kind != ContainerKind::Subprogram {
            debug!(
                "Skipping non-subprogram implementation {}.{}",
                entry.interface, entry.implementation
            );
            continue;
        }
        if system.interface(&entry.interface).is_none() {
            bail!(
                "Catalog entry {}.{} references the unknown interface {}",
                entry.interface,
                entry.implementation,
                entry.interface
            );
        }
        catalog.entries.push(entry.clone());
    }

    // registry files in discovery order, across every declared interface
    for interface in &system.interfaces {
        for param in &interface.params {
            let signal = param.bound_signal()?;
            if !catalog.registry_files.contains(&signal.file) {
                catalog.registry_files.push(signal.file.clone());
            }
        }
    }

    // which languages need which file, and for which interfaces
    for entry in &catalog.entries {
        let Some(language) = &entry.language else {
            continue;
        };
        let interface = system
            .interface(&entry.interface)
            .expect("Entries are validated above");
        for param in &interface.params {
            let signal = param.bound_signal()?;
            catalog
                .by_file
                .entry(signal.file.clone())
                .or_default()
                .entry(language.clone())
                .or_default()
                .push(interface.id.clone());
        }
    }

    Ok(catalog)
}

/// Annotate the parameter-bound types with the size hints of their signals and
/// enforce the parameter policy checks.
///
/// Two checks live here: a parameter bound to unbounded text is rejected (a
/// fixed-width OCTET STRING must be used instead), and a GUI command interface
/// with zero parameters is rejected unless it is named as a polling interface.
pub fn annotate_catalog(
    catalog: &Catalog,
    system: &SystemDescription,
    registry: &mut TypeRegistry,
) -> Result<()> {
    for entry in &catalog.entries {
        let Some(interface) = system.interface(&entry.interface) else {
            continue;
        };
        for param in &interface.params {
            let signal = param.bound_signal()?;
            let Some(file) = registry.file_mut(&signal.file) else {
                bail!("Registry file {} was never loaded", signal.file.display());
            };
            let Some(def) = file.lookup_mut(&signal.type_name) else {
                bail!(
                    "Parameter {} of {} resolves to type {} which is not defined in {}",
                    param.id,
                    interface.id,
                    signal.type_name,
                    signal.file.display()
                );
            };
            if def.leaf == LeafKind::AsciiString {
                bail!(
                    "You cannot use unbounded text as a parameter - use OCTET STRING instead \
                     ({} bound to parameter {} of {})",
                    signal.type_name,
                    param.id,
                    interface.id
                );
            }
            def.size = signal.size;
        }
    }

    for entry in &catalog.entries {
        let Some(language) = &entry.language else {
            continue;
        };
        if language.to_lowercase() != "gui_ri" {
            continue;
        }
        let Some(interface) = system.interface(&entry.interface) else {
            continue;
        };
        if interface.params.is_empty() && !interface.id.contains("gui_polling") {
            bail!(
                "GUI command interfaces must declare at least one parameter (fix {})",
                interface.id
            );
        }
    }

    Ok(())
}
