use clap::Parser;

use polyconv::error::NiceError;
use polyconv::{main_local, Opt};

fn main() {
    let opt = Opt::parse();
    opt.logger.enable_log();
    main_local(opt).nice_unwrap();
}
