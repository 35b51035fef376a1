//! scrape the figures out of the HLS and RTL report files

use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::{eyre, Context, Result};
use itertools::Itertools;
use tracing::{error, info};

use crate::{
    report::{MetricRow, ToolchainMetrics},
    savings::round_to,
    settings::LatencyLayout,
};

/// metric names in the HLS export report: LUT, FF, DSP, BRAM
pub const HLS_UTIL_METRICS: [&str; 4] = ["LUT", "FF", "DSP", "BRAM"];
/// the same metrics in the RTL utilization report
pub const RTL_UTIL_METRICS: [&str; 4] = ["CLB LUTs", "CLB Registers", "DSPs", "Block RAM Tile"];

const HLS_PERIOD_MARKER: &str = "CP achieved post-synthesis";
const HLS_LATENCY_MARKER: &str = "Verilog";

/// all report files of one configuration point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub hls_util: PathBuf,
    pub hls_latency: PathBuf,
    pub hls_exec: PathBuf,
    pub rtl_util: PathBuf,
    pub rtl_timing: PathBuf,
    pub rtl_latency: PathBuf,
    pub rtl_exec: PathBuf,
}

impl ReportPaths {
    pub fn new(hls_tb: &Path, rtl_root: &Path, test_name: &str, rtl_run: &str) -> Self {
        let hls_syn = hls_tb.join(format!("hls-syn-{}", test_name.replace('_', "-")));
        let rtl_project = rtl_root
            .join("proj")
            .join("syn")
            .join(format!("{}_project", rtl_run));
        ReportPaths {
            hls_util: hls_syn
                .join("sol1/impl/report/verilog")
                .join(format!("Testbench_{}_export.rpt", test_name)),
            hls_latency: hls_syn
                .join("sol1/sim/report")
                .join(format!("Testbench_{}_cosim.rpt", test_name)),
            hls_exec: hls_tb.join("hls_exec.rpt"),
            rtl_util: rtl_project.join("post_opt_util.rpt"),
            rtl_timing: rtl_project.join("post_opt_timing.rpt"),
            rtl_latency: rtl_root.join("proj/sim/latency.txt"),
            rtl_exec: rtl_root.join("proj/syn/rtl_exec.rpt"),
        }
    }
}

/// where the execution times of one point come from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecTimes {
    Reports,
    /// seconds measured around the HLS and RTL scripts
    Measured { hls: f64, rtl: f64 },
}

fn read_report(path: &Path, kind: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| {
            error!("Cannot read the {} file {:?}", kind, path);
            e
        })
        .wrap_err_with(|| format!("cannot read the {} {:?}", kind, path))
}

fn parse_number(token: &str, kind: &str, path: &Path) -> Result<f64> {
    token.trim().parse::<f64>().map_err(|e| {
        error!("Cannot parse {:?} in the {} file {:?}", token, kind, path);
        eyre!("malformed value {:?} in the {} {:?}: {}", token, kind, path, e)
    })
}

/// resource counts of the HLS export report and the clock period achieved
/// after synthesis, rounded to 3 decimals
pub fn extract_hls_data<const N: usize>(
    log_file: &Path,
    params: &[&str; N],
) -> Result<([u64; N], f64)> {
    const KIND: &str = "HLS reports";
    info!("Extracting data from HLS log file");
    let content = read_report(log_file, KIND)?;
    let mut block: [Option<u64>; N] = [None; N];
    let mut period = None;
    for line in content.lines() {
        for (slot, param) in block.iter_mut().zip(params) {
            if slot.is_none() && line.contains(param) {
                let token = line
                    .split_whitespace()
                    .nth(1)
                    .ok_or_else(|| eyre!("no value for {} in {:?}", param, log_file))?;
                *slot = Some(parse_number(token, KIND, log_file)? as u64);
            }
        }
        if line.contains(HLS_PERIOD_MARKER) {
            let token = line.split_whitespace().last().unwrap_or_default();
            period = Some(round_to(parse_number(token, KIND, log_file)?, 3));
        }
    }
    let block = collect_metrics(block, params, log_file)?;
    let period =
        period.ok_or_else(|| eyre!("no {:?} line in {:?}", HLS_PERIOD_MARKER, log_file))?;
    Ok((block, period))
}

/// resource counts of the RTL utilization tables, the "Used" column
pub fn extract_rtl_block_data<const N: usize>(
    log_file: &Path,
    params: &[&str; N],
) -> Result<[u64; N]> {
    const KIND: &str = "RTL utilization report";
    info!("Extracting data from RTL utilization report");
    let content = read_report(log_file, KIND)?;
    let mut block: [Option<u64>; N] = [None; N];
    for (slot, param) in block.iter_mut().zip(params) {
        for line in content.lines().map(str::trim_end) {
            let fields = line.split('|').collect_vec();
            if line.contains(param) && fields.len() > 2 {
                *slot = Some(parse_number(fields[2], KIND, log_file)? as u64);
                break;
            }
        }
    }
    collect_metrics(block, params, log_file)
}

fn collect_metrics<const N: usize>(
    values: [Option<u64>; N],
    params: &[&str; N],
    log_file: &Path,
) -> Result<[u64; N]> {
    let mut block = [0; N];
    for ((slot, value), param) in block.iter_mut().zip(values).zip(params) {
        *slot = value.ok_or_else(|| eyre!("no {} entry in {:?}", param, log_file))?;
    }
    Ok(block)
}

/// margin left against the clock constraint, rounded to 3 decimals
pub fn extract_rtl_timing_data(log_file: &Path, clk_per: f64) -> Result<f64> {
    const KIND: &str = "RTL timing report";
    info!("Extracting data from RTL timing report");
    let content = read_report(log_file, KIND)?;
    let token = content
        .split_whitespace()
        .last()
        .ok_or_else(|| eyre!("empty {} {:?}", KIND, log_file))?;
    let achieved = parse_number(token, KIND, log_file)?;
    Ok(round_to(clk_per - achieved, 3))
}

/// latency column of the last Verilog row in the cosimulation report
pub fn extract_hls_latency(log_file: &Path, layout: LatencyLayout) -> Result<u64> {
    const KIND: &str = "HLS latency report";
    info!("Extracting latency information from HLS run");
    let content = read_report(log_file, KIND)?;
    let row = content
        .lines()
        .filter(|line| line.contains(HLS_LATENCY_MARKER))
        .last()
        .ok_or_else(|| eyre!("no {} row in {:?}", HLS_LATENCY_MARKER, log_file))?
        .replace(' ', "");
    let field = row.split('|').nth(layout.field()).ok_or_else(|| {
        eyre!(
            "{} row of {:?} has no field {}",
            HLS_LATENCY_MARKER,
            log_file,
            layout.field()
        )
    })?;
    Ok(parse_number(field, KIND, log_file)? as u64)
}

/// the number on the last non-empty line
fn last_value(log_file: &Path, kind: &str) -> Result<f64> {
    let content = read_report(log_file, kind)?;
    let line = content
        .lines()
        .map(|line| line.replace(' ', ""))
        .filter(|line| !line.trim().is_empty())
        .last()
        .ok_or_else(|| eyre!("empty {} {:?}", kind, log_file))?;
    parse_number(&line, kind, log_file)
}

pub fn extract_rtl_latency(log_file: &Path) -> Result<u64> {
    info!("Extracting latency information from RTL run");
    Ok(last_value(log_file, "RTL latency report")? as u64)
}

pub fn extract_hls_exec(log_file: &Path) -> Result<f64> {
    info!("Extracting execution time information from HLS run");
    last_value(log_file, "HLS synthesis execution time")
}

pub fn extract_rtl_exec(log_file: &Path) -> Result<f64> {
    info!("Extracting execution time information from RTL run");
    last_value(log_file, "RTL synthesis execution time")
}

/// read every report of a point and build its metric row
pub fn extract_data(
    paths: &ReportPaths,
    clk_per: f64,
    layout: LatencyLayout,
    exec: ExecTimes,
) -> Result<MetricRow> {
    let (hls_block, hls_period) = extract_hls_data(&paths.hls_util, &HLS_UTIL_METRICS)?;
    let hls_latency = extract_hls_latency(&paths.hls_latency, layout)?;

    let rtl_block = extract_rtl_block_data(&paths.rtl_util, &RTL_UTIL_METRICS)?;
    let rtl_period = extract_rtl_timing_data(&paths.rtl_timing, clk_per)?;
    let rtl_latency = extract_rtl_latency(&paths.rtl_latency)?;

    let (hls_exec, rtl_exec) = match exec {
        ExecTimes::Reports => (
            extract_hls_exec(&paths.hls_exec)?,
            extract_rtl_exec(&paths.rtl_exec)?,
        ),
        ExecTimes::Measured { hls, rtl } => (hls, rtl),
    };

    let hls = ToolchainMetrics::from_block(hls_block, hls_period, hls_latency, hls_exec);
    let rtl = ToolchainMetrics::from_block(rtl_block, rtl_period, rtl_latency, rtl_exec);
    Ok(MetricRow::new(hls, rtl))
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    const HLS_EXPORT: &str = "\
#=== Post-Synthesis Resource usage ===
SLICE:            0
LUT:            320
FF:             410
DSP:              0
SRL:              3
BRAM:             2
URAM:             0
#=== Final timing ===
CP required:                     5.000
CP achieved post-synthesis:      3.1574
";

    const RTL_UTIL: &str = "\
+----------------------------+------+-------+-----------+-------+
|          Site Type         | Used | Fixed | Available | Util% |
+----------------------------+------+-------+-----------+-------+
| CLB LUTs*                  |  256 |     0 |    230400 |  0.11 |
| CLB Registers              |  300 |     0 |    460800 |  0.07 |
| Block RAM Tile             |  1.5 |     0 |       312 |  0.48 |
| DSPs                       |    0 |     0 |      1728 |  0.00 |
";

    const COSIM: &str = "\
| RTL | Status | min | avg | max | min | avg | max | total |
| VHDL | NA | NA | NA | NA | NA | NA | NA | NA |
| Verilog | Pass | 10 | 12 | 14 | 11 | 12 | 13 | 150 |
";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn hls_utilization_and_period() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write(dir.path(), "export.rpt", HLS_EXPORT);
        let (block, period) = extract_hls_data(&path, &HLS_UTIL_METRICS)?;
        assert_eq!(block, [320, 410, 0, 2]);
        assert_eq!(period, 3.157);
        Ok(())
    }

    #[test]
    fn rtl_utilization() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write(dir.path(), "util.rpt", RTL_UTIL);
        let block = extract_rtl_block_data(&path, &RTL_UTIL_METRICS)?;
        assert_eq!(block, [256, 300, 0, 1]);
        Ok(())
    }

    #[test]
    fn missing_metric_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write(dir.path(), "util.rpt", "| CLB LUTs* | 256 |\n");
        assert!(extract_rtl_block_data(&path, &RTL_UTIL_METRICS).is_err());
        Ok(())
    }

    #[test]
    fn timing_margin() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write(dir.path(), "timing.rpt", "Data Path Delay\n  slack\n 2.3456\n");
        assert_eq!(extract_rtl_timing_data(&path, 5.0)?, 2.654);
        Ok(())
    }

    #[test]
    fn latency_field_per_layout() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write(dir.path(), "cosim.rpt", COSIM);
        assert_eq!(extract_hls_latency(&path, LatencyLayout::Mvau)?, 12);
        assert_eq!(extract_hls_latency(&path, LatencyLayout::Stream)?, 10);
        Ok(())
    }

    #[test]
    fn last_line_readers() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let latency = write(dir.path(), "latency.txt", "  17\n  18 \n\n");
        let exec = write(dir.path(), "exec.rpt", "12.5\n");
        assert_eq!(extract_rtl_latency(&latency)?, 18);
        assert_eq!(extract_hls_exec(&exec)?, 12.5);
        assert_eq!(extract_rtl_exec(&exec)?, 12.5);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = extract_rtl_exec(Path::new("/nonexistent/rtl_exec.rpt")).unwrap_err();
        assert!(format!("{:?}", err).contains("RTL synthesis execution time"));
    }

    #[test]
    fn malformed_value_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write(dir.path(), "latency.txt", "done\n");
        assert!(extract_rtl_latency(&path).is_err());
        Ok(())
    }

    #[test]
    fn report_paths() {
        let paths = ReportPaths::new(
            Path::new("/finn/tb"),
            Path::new("/mvau"),
            "mvau_batch0_std",
            "mvau",
        );
        assert_eq!(
            paths.hls_util,
            PathBuf::from(
                "/finn/tb/hls-syn-mvau-batch0-std/sol1/impl/report/verilog/Testbench_mvau_batch0_std_export.rpt"
            )
        );
        assert_eq!(
            paths.hls_latency,
            PathBuf::from("/finn/tb/hls-syn-mvau-batch0-std/sol1/sim/report/Testbench_mvau_batch0_std_cosim.rpt")
        );
        assert_eq!(paths.hls_exec, PathBuf::from("/finn/tb/hls_exec.rpt"));
        assert_eq!(
            paths.rtl_util,
            PathBuf::from("/mvau/proj/syn/mvau_project/post_opt_util.rpt")
        );
        assert_eq!(
            paths.rtl_timing,
            PathBuf::from("/mvau/proj/syn/mvau_project/post_opt_timing.rpt")
        );
        assert_eq!(paths.rtl_latency, PathBuf::from("/mvau/proj/sim/latency.txt"));
        assert_eq!(paths.rtl_exec, PathBuf::from("/mvau/proj/syn/rtl_exec.rpt"));
    }
}
