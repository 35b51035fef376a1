use std::path::{Path, PathBuf};

use config::{Config, FileFormat};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::configuration::{ArithMode, OutWidth};

/// the built-in sweep, the single-point MVAU regression
pub const DEFAULT_SETTINGS: &str = include_str!("../configs/default.toml");

pub const FINN_HLS_ROOT: &str = "FINN_HLS_ROOT";
pub const MVAU_RTL_ROOT: &str = "MVAU_RTL_ROOT";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Settings {
    /// exit status used when the sweep is stopped by Ctrl+C
    pub interrupt_exit_code: i32,
    pub sweep: SweepSettings,
    pub variant: VariantSettings,
    pub tests: TestNames,
    pub paths: ToolchainPaths,
    pub report: ReportSettings,
    pub hdl: HdlSettings,
}

/// the parameter arrays, grouped arrays are iterated element-wise
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SweepSettings {
    pub kdim: Vec<u32>,
    /// paired with `ifm_dim` and `ofm_ch`
    pub ifm_ch: Vec<u32>,
    pub ifm_dim: Vec<u32>,
    pub ofm_ch: Vec<u32>,
    /// paired with `wgt_wl`, and with the sign arrays when signs are enabled
    pub inp_wl: Vec<u32>,
    #[serde(default)]
    pub inp_sgn: Vec<u8>,
    pub wgt_wl: Vec<u32>,
    #[serde(default)]
    pub wgt_sgn: Vec<u8>,
    /// paired with `pe`
    pub simd: Vec<u32>,
    pub pe: Vec<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LatencyLayout {
    /// whole MVAU cosimulation report
    Mvau,
    /// stream-only cosimulation report
    Stream,
}

impl LatencyLayout {
    /// the pipe-delimited field holding the latency
    pub fn field(&self) -> usize {
        match self {
            LatencyLayout::Mvau => 7,
            LatencyLayout::Stream => 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecTimeSource {
    /// read from the exec-time reports the test scripts write
    Report,
    /// measured around the test script invocations
    WallClock,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pairing {
    /// paired arrays of different length are rejected
    Strict,
    /// paired arrays are cut to the shortest one
    Truncate,
}

/// the knobs that used to be separate copies of the regression script
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VariantSettings {
    pub signs: bool,
    pub latency_layout: LatencyLayout,
    pub exec_time: ExecTimeSource,
    pub pairing: Pairing,
    /// synthesis clock constraint in ns
    pub clock_period: f64,
    pub out_width: OutWidth,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TestNames {
    pub xnor: String,
    pub bin_wgt: String,
    pub std: String,
    /// the RTL synthesis project shared by all modes
    pub rtl_run: String,
}

impl TestNames {
    pub fn name(&self, mode: ArithMode) -> &str {
        match mode {
            ArithMode::Xnor => &self.xnor,
            ArithMode::BinWgt => &self.bin_wgt,
            ArithMode::Std => &self.std,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ToolchainPaths {
    pub finn_hls_root: PathBuf,
    pub mvau_rtl_root: PathBuf,
}

impl ToolchainPaths {
    /// where the HLS test scripts live and write their reports
    pub fn hls_tb(&self) -> PathBuf {
        self.finn_hls_root.join("tb")
    }
    /// where the RTL test scripts live
    pub fn rtl_tb(&self) -> PathBuf {
        self.mvau_rtl_root.join("proj").join("RegressionTests")
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ReportSettings {
    pub out_file: PathBuf,
    /// also dump the rows as json next to the workbook
    pub json: bool,
}

/// parameters of the generated HDL files
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HdlSettings {
    pub kdim: u32,
    pub inp_wl: u32,
    pub inp_bin: u32,
    pub ifm_ch: u32,
    pub ofm_ch: u32,
    pub ifm_dim: u32,
    pub wgt_wl: u32,
    pub wgt_bin: u32,
    pub op_sgn: u32,
    pub out_wl: u32,
    pub simd: u32,
    pub pe: u32,
    pub mmv: u32,
    pub stride: u32,
}

impl Settings {
    /// layer the built-in defaults, the toolchain roots from the environment,
    /// the given files in order and finally the output file override
    pub fn new(config_files: &[PathBuf], out_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("paths.finn_hls_root", env_root(FINN_HLS_ROOT))?
            .set_default("paths.mvau_rtl_root", env_root(MVAU_RTL_ROOT))?
            .add_source(config::File::from_str(DEFAULT_SETTINGS, FileFormat::Toml));
        for file in config_files {
            builder = builder.add_source(config::File::from(file.as_path()));
        }
        if let Some(out_file) = out_file {
            builder = builder.set_override("report.out_file", out_file.to_string_lossy().as_ref())?;
        }
        let settings = builder.build().wrap_err("cannot build Setting object")?;
        let ret = settings
            .try_deserialize()
            .wrap_err("failed to deserialize")?;
        Ok(ret)
    }

    /// the merged settings as a toml file that can be passed back with `-c`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).wrap_err("fail to serialize settings")
    }
}

fn env_root(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        warn!("{} is not set, report paths will be relative", name);
        String::new()
    })
}
