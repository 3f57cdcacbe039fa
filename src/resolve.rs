use std::collections::HashMap;

use anyhow::{bail, Result};

use glue_maker_model::{Signal, SignalRef, SystemDescription};

/// Bind every parameter of every interface to the signal its declared name
/// refers to.
///
/// Resolution is all-or-nothing: an unknown name aborts the run before any
/// catalog is built, naming the offending parameter and interface. Parameters
/// that are already resolved (e.g. from a merged pre-resolved document) are
/// left untouched.
pub fn resolve_signals(system: &mut SystemDescription) -> Result<()> {
    let table: HashMap<String, Signal> = system
        .signals
        .iter()
        .map(|decl| (decl.name.clone(), decl.signal.clone()))
        .collect();
    for interface in &mut system.interfaces {
        debug!("Resolving data definitions in interface {}...", interface.id);
        for param in &mut interface.params {
            if let SignalRef::Named(name) = &param.signal {
                match table.get(name) {
                    Some(signal) => param.signal = SignalRef::Resolved(signal.clone()),
                    None => bail!(
                        "Unknown data type {} in the definition of {} (parameter {})",
                        name,
                        interface.id,
                        param.id
                    ),
                }
            }
        }
    }
    Ok(())
}
