//! # glue-maker-rust
//!
//! This is both an application and a library: the library can be used to run
//! the same generation pipeline of the glue-maker binary inside your
//! application.
//!
//! The pipeline is strictly sequential: parse and merge the input documents,
//! resolve every parameter's signal, build the catalog, load the referenced
//! type registries, then dispatch each catalog entry through its backend
//! lifecycle and replay the dual-target entries to their cooperating
//! backends. Any failure aborts the run; there is no partial-success mode.

#[macro_use]
extern crate log;

pub mod asn1scc;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod opt;
pub mod resolve;
pub mod special;
#[cfg(test)]
mod test_utils;

use anyhow::{ensure, Result};

use glue_maker_lang::BackendManager;
use glue_maker_model::{SystemDescription, TypeRegistry};

use crate::asn1scc::{needs_external_compiler, run_external_compiler};
use crate::catalog::{annotate_catalog, build_catalog};
use crate::dispatch::{DispatchContext, DispatchOptions};
use crate::opt::Opt;
use crate::resolve::resolve_signals;
use crate::special::dispatch_special;

/// Entry point of a full generation run.
pub fn main_run(opt: Opt) -> Result<()> {
    ensure!(
        opt.output_dir.is_dir(),
        "'{}' is not a directory!",
        opt.output_dir.display()
    );
    let mut system = SystemDescription::default();
    for input in &opt.inputs {
        ensure!(input.is_file(), "'{}' is not a file!", input.display());
        info!("Parsing {}...", input.display());
        system.merge(SystemDescription::load(input)?);
    }

    resolve_signals(&mut system)?;
    let catalog = build_catalog(&system, opt.only_subprograms)?;
    let mut registry = TypeRegistry::load_all(&catalog.registry_files)?;
    annotate_catalog(&catalog, &system, &mut registry)?;

    if needs_external_compiler(&catalog) {
        run_external_compiler(&opt.output_dir, &catalog.registry_files)?;
    }

    let options = DispatchOptions {
        output_dir: opt.output_dir.clone(),
        use_external_codecs: opt.external_codecs,
        prune_artificial_members: opt.prune_artificial_members,
    };
    let mut ctx = DispatchContext::new(BackendManager::new(), options);
    ctx.dispatch(&catalog, &system, &registry)?;
    dispatch_special(&mut ctx, &catalog, &system, &registry)?;
    Ok(())
}
