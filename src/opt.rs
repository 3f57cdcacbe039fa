use std::path::PathBuf;

use clap::{Args, Parser};

/// Command line options of the glue-maker binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "glue-maker")]
pub struct Opt {
    /// Interface-description input files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory where the generated glue sources are written
    ///
    /// The directory must already exist.
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Only process subprogram-level implementations
    ///
    /// Thread- and process-level implementations are kept in the catalog but
    /// no glue is generated for them.
    #[arg(long = "only-subprograms")]
    pub only_subprograms: bool,

    /// Rely on externally generated codecs instead of the bundled ones
    #[arg(long = "external-codecs")]
    pub external_codecs: bool,

    /// Do not offer asynchronous backends the types that are only reachable
    /// through artificial containers
    #[arg(long = "prune-artificial-members")]
    pub prune_artificial_members: bool,

    #[command(flatten)]
    pub logger: LoggerOpt,
}

/// Verbosity options, shared by every entry point.
#[derive(Args, Debug, Clone)]
pub struct LoggerOpt {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl LoggerOpt {
    /// Enable the logs at the level selected with `-v`.
    pub fn enable_log(&self) {
        if self.verbose > 0 {
            std::env::set_var("RUST_BACKTRACE", "1");
            match self.verbose {
                1 => std::env::set_var("RUST_LOG", "info"),
                2 => std::env::set_var("RUST_LOG", "debug"),
                _ => std::env::set_var("RUST_LOG", "trace"),
            }
        }

        env_logger::Builder::from_default_env()
            .format_timestamp_nanos()
            .init();
        better_panic::install();
    }
}
