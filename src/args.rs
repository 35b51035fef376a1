use std::path::PathBuf;

use clap::{Parser, ValueHint};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[clap(version,about="MVAU HLS versus RTL regression harness",long_about=None,trailing_var_arg=true)]
pub struct Args {
    /// Generate completion for the given shell
    #[clap(long = "generate", short = 'g', arg_enum)]
    pub generator: Option<Shell>,
    /// sweep runs the regression, hdl writes the RTL sources; default is sweep
    #[clap(long = "run-mode", short = 'r', arg_enum)]
    pub run_mode: Option<RunMode>,
    /// the report workbook, overrides `report.out_file`
    #[clap(long = "out_file", short = 'o', parse(from_os_str), value_hint=ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
    /// where the hdl run mode writes its files
    #[clap(long = "hdl-dir", parse(from_os_str), value_hint=ValueHint::DirPath)]
    pub hdl_dir: Option<PathBuf>,
    /// print the effective settings as toml and exit
    #[clap(long = "dump-config")]
    pub dump_config: bool,
    /// sweep definitions layered over the built-in defaults, later files win
    #[clap(parse(from_os_str),value_hint=ValueHint::FilePath)]
    pub config_file: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ArgEnum)]
pub enum RunMode {
    Sweep,
    Hdl,
}
