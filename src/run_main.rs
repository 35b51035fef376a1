use std::io;
use std::path::Path;

use clap::{Command, IntoApp};
use clap_complete::Generator;
use eyre::{Context, Result};
use tracing::{debug, info};

use crate::{
    args::{Args, RunMode},
    driver::Driver,
    hdl,
    init_logger,
    interrupt::InterruptFlag,
    settings::Settings,
    toolchain::ScriptRunner,
};

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    clap_complete::generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// run the harness, returning the process exit status
pub fn main(args: Args) -> Result<i32> {
    init_logger();
    let start_time = std::time::Instant::now();
    if let Some(generator) = args.generator {
        let mut cmd = Args::command();
        eprintln!("Generating completion file for {:?}...", generator);
        print_completions(generator, &mut cmd);
        return Ok(0);
    }
    info!("start regression with {:?}", args);

    let settings = Settings::new(&args.config_file, args.out_file.as_deref())
        .wrap_err("fail to create Setting object")?;
    debug!("{:?}", settings);

    if args.dump_config {
        println!("{}", settings.to_toml()?);
        return Ok(0);
    }

    let code = match args.run_mode.unwrap_or(RunMode::Sweep) {
        RunMode::Sweep => {
            let interrupt = InterruptFlag::install()?;
            let mut driver = Driver::new(&settings, ScriptRunner, interrupt);
            let outcome = driver.run()?;
            info!("sweep finished: {:?}", outcome);
            outcome.exit_code(settings.interrupt_exit_code)
        }
        RunMode::Hdl => {
            let dir = args.hdl_dir.as_deref().unwrap_or_else(|| Path::new("."));
            let written = hdl::generate_all(&settings.hdl, dir)?;
            info!("{} files generated in {:?}", written.len(), dir);
            0
        }
    };
    info!(
        "running time: {:?}'s",
        std::time::Instant::now()
            .duration_since(start_time)
            .as_secs_f64()
    );
    Ok(code)
}
