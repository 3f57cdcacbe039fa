use clap::Parser;

use glue_maker_rust::error::NiceError;
use glue_maker_rust::main_run;
use glue_maker_rust::opt::Opt;

fn main() {
    let opt = Opt::parse();
    opt.logger.enable_log();
    main_run(opt).nice_unwrap()
}
