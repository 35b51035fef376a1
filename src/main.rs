use std::env::args_os;

use clap::Parser;
use eyre::Result;
use mvau_regtest::{args::Args, run_main};
fn main() -> Result<()> {
    let args = args_os();
    let args = Args::parse_from(args);
    let code = run_main::main(args)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
