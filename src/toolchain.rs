//! invocation of the external HLS and RTL test scripts

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    process::Command,
    time::{Duration, Instant},
};

use eyre::Result;
use tracing::{debug, error, info};

use crate::configuration::{ArithMode, Configuration};

/// the status a test script exits with when the test passed
pub const SUCCESS_STATUS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolchain {
    Hls,
    Rtl,
}

impl Display for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Toolchain::Hls => write!(f, "HLS"),
            Toolchain::Rtl => write!(f, "RTL"),
        }
    }
}

/// one call of a test script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub toolchain: Toolchain,
    pub script: String,
    pub cwd: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// `./test_<name>.sh` in the HLS test bench
    pub fn hls(config: &Configuration, test_name: &str, signs: bool, cwd: &Path) -> Self {
        let mut args = vec![
            config.ifm_ch.to_string(),
            config.ifm_dim.to_string(),
            config.ofm_ch.to_string(),
            config.kdim.to_string(),
        ];
        if signs && config.mode() == ArithMode::Std {
            args.extend([
                config.inp_wl.to_string(),
                u8::from(config.inp_signed).to_string(),
                config.wgt_wl.to_string(),
                u8::from(config.wgt_signed).to_string(),
            ]);
        } else {
            args.extend([config.inp_wl.to_string(), config.wgt_wl.to_string()]);
        }
        args.extend([
            config.out_wl.to_string(),
            config.simd.to_string(),
            config.pe.to_string(),
        ]);
        Invocation {
            toolchain: Toolchain::Hls,
            script: format!("./test_{}.sh", test_name),
            cwd: cwd.to_path_buf(),
            args,
        }
    }

    /// `./test_<name>_rtl.sh` in the RTL regression directory
    ///
    /// The sign slots carry fixed per-mode flags, not the swept signs; the
    /// signed standard flow appends the operator sign code instead.
    pub fn rtl(config: &Configuration, test_name: &str, signs: bool, cwd: &Path) -> Self {
        let mode = config.mode();
        let (inp_flag, wgt_flag) = match mode {
            ArithMode::Xnor => (1, 1),
            ArithMode::BinWgt => (0, 1),
            ArithMode::Std => (0, 0),
        };
        let mut args = vec![
            config.ifm_ch.to_string(),
            config.ifm_dim.to_string(),
            config.ofm_ch.to_string(),
            config.kdim.to_string(),
            config.inp_wl.to_string(),
            inp_flag.to_string(),
            config.wgt_wl.to_string(),
            wgt_flag.to_string(),
        ];
        if signs && mode == ArithMode::Std {
            args.push(config.op_sign().code().to_string());
        }
        args.extend([
            config.out_wl.to_string(),
            config.simd.to_string(),
            config.pe.to_string(),
        ]);
        Invocation {
            toolchain: Toolchain::Rtl,
            script: format!("./test_{}_rtl.sh", test_name),
            cwd: cwd.to_path_buf(),
            args,
        }
    }
}

/// how a test script finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestStatus {
    /// `None` when the script could not be started or was killed by a signal
    pub code: Option<i32>,
    pub elapsed: Duration,
}

impl TestStatus {
    pub fn passed(&self) -> bool {
        self.code == Some(SUCCESS_STATUS)
    }
}

/// runs one test script to completion
pub trait TestRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<TestStatus>;
}

/// spawns the scripts as child processes and blocks until they exit
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptRunner;

impl TestRunner for ScriptRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<TestStatus> {
        info!(
            "calling the {} test script {} {}",
            invocation.toolchain,
            invocation.script,
            invocation.args.join(" ")
        );
        let start = Instant::now();
        // the script name is relative to the working directory of the child
        let status = Command::new(&invocation.script)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status();
        let elapsed = start.elapsed();
        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                error!(
                    "cannot start {} in {:?}: {}",
                    invocation.script, invocation.cwd, e
                );
                None
            }
        };
        debug!(?code, ?elapsed, "test script finished");
        Ok(TestStatus { code, elapsed })
    }
}
