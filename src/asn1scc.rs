use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{ensure, Context, Result};
use itertools::Itertools;

use crate::catalog::Catalog;

/// Whether any catalog entry needs the external structural-type compiler.
///
/// The Ada targets link against natively generated encodings instead of the
/// bundled codecs, so their presence in the catalog triggers the compiler
/// pass.
pub fn needs_external_compiler(catalog: &Catalog) -> bool {
    catalog
        .entries
        .iter()
        .filter_map(|entry| entry.language.as_deref())
        .any(|language| matches!(language.to_lowercase().as_str(), "ada" | "qgenada"))
}

/// Invoke the external structural-type compiler over the registry files.
///
/// This runs before any backend is invoked; a compiler missing from `$PATH` or
/// a failing invocation aborts the run.
pub fn run_external_compiler(output_dir: &Path, registry_files: &[PathBuf]) -> Result<()> {
    let compiler = which::which("asn1scc").context(
        "The structural-type compiler seems not installed on your system \
         (asn1scc not found in PATH)",
    )?;
    info!(
        "Compiling {} with {}...",
        registry_files.iter().map(|file| file.display()).join(" "),
        compiler.display()
    );
    let status = Command::new(&compiler)
        .args(["-wordSize", "8"])
        .args(["-typePrefix", "asn1Scc"])
        .args(["-Ada", "-equal", "-uPER"])
        .arg("-o")
        .arg(output_dir)
        .args(registry_files)
        .status()
        .with_context(|| format!("Failed to run {}", compiler.display()))?;
    ensure!(
        status.success(),
        "The structural-type compiler failed with {}",
        status
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use glue_maker_model::CatalogEntry;

    use super::*;

    fn entry(language: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            interface: "compute".into(),
            implementation: "impl1".into(),
            language: language.map(String::from),
            fv_name: None,
            kind: Default::default(),
        }
    }

    #[test]
    fn test_needs_external_compiler() {
        let catalog = Catalog {
            entries: vec![entry(Some("C")), entry(None)],
            ..Default::default()
        };
        assert_that!(needs_external_compiler(&catalog)).is_false();

        let catalog = Catalog {
            entries: vec![entry(Some("C")), entry(Some("Ada"))],
            ..Default::default()
        };
        assert_that!(needs_external_compiler(&catalog)).is_true();

        let catalog = Catalog {
            entries: vec![entry(Some("QGenAda"))],
            ..Default::default()
        };
        assert_that!(needs_external_compiler(&catalog)).is_true();
    }
}
