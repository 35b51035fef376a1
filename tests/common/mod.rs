#![allow(dead_code)]

use std::{collections::VecDeque, fs, path::Path, time::Duration};

use eyre::Result;
use mvau_regtest::{
    extract::ReportPaths,
    interrupt::InterruptFlag,
    settings::Settings,
    toolchain::{Invocation, TestRunner, TestStatus},
};

pub const HLS_EXPORT: &str = "\
== Utilization Estimates
LUT:            320
FF:             410
DSP:              0
BRAM:             2
== Timing
CP required:                     5.000
CP achieved post-synthesis:      3.1574
";

pub const HLS_COSIM: &str = "\
|     RTL     | Status | min | avg | max | min | avg | max | total |
|     VHDL    |   NA   |  NA |  NA |  NA |  NA |  NA |  NA |    NA |
|   Verilog   |  Pass  |  10 |  12 |  14 |  11 |  12 |  13 |   150 |
";

pub const RTL_UTIL: &str = "\
| CLB LUTs*                  |  256 |     0 |    230400 |  0.11 |
| CLB Registers              |  300 |     0 |    460800 |  0.07 |
| Block RAM Tile             |  1.5 |     0 |       312 |  0.48 |
| DSPs                       |    0 |     0 |      1728 |  0.00 |
";

/// settings whose toolchain roots and report live under `root`
pub fn settings_in(root: &Path) -> Result<Settings> {
    let mut settings = Settings::new(&[], None)?;
    settings.paths.finn_hls_root = root.join("finn-hlslib");
    settings.paths.mvau_rtl_root = root.join("mvau");
    settings.report.out_file = root.join("out").join("mvau_report.xlsx");
    Ok(settings)
}

/// a sweep of `points` standard-mode points, one per PE value
pub fn std_sweep(settings: &mut Settings, points: usize) {
    let sweep = &mut settings.sweep;
    sweep.kdim = vec![1];
    sweep.ifm_ch = vec![4];
    sweep.ifm_dim = vec![4];
    sweep.ofm_ch = vec![8];
    sweep.inp_wl = vec![4];
    sweep.wgt_wl = vec![4];
    sweep.simd = vec![1; points];
    sweep.pe = [1, 2, 4, 8][..points].to_vec();
}

fn write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// lay out the report files both flows would leave behind for `test_name`
pub fn write_fake_reports(settings: &Settings, test_name: &str, with_exec: bool) -> Result<()> {
    let paths = ReportPaths::new(
        &settings.paths.hls_tb(),
        &settings.paths.mvau_rtl_root,
        test_name,
        &settings.tests.rtl_run,
    );
    write(&paths.hls_util, HLS_EXPORT)?;
    write(&paths.hls_latency, HLS_COSIM)?;
    write(&paths.rtl_util, RTL_UTIL)?;
    write(&paths.rtl_timing, "Slack (MET)\n  data arrival   2.345\n")?;
    write(&paths.rtl_latency, "17\n18\n")?;
    if with_exec {
        write(&paths.hls_exec, "42.5\n")?;
        write(&paths.rtl_exec, "30.0\n")?;
    }
    Ok(())
}

/// answers the scripts from a queue of exit codes, passing once it runs dry
pub struct ScriptedRunner {
    pub calls: Vec<Invocation>,
    codes: VecDeque<Option<i32>>,
    elapsed: Duration,
    interrupt: Option<(usize, InterruptFlag)>,
}

impl ScriptedRunner {
    pub fn passing() -> Self {
        ScriptedRunner {
            calls: vec![],
            codes: VecDeque::new(),
            elapsed: Duration::from_millis(2500),
            interrupt: None,
        }
    }

    pub fn with_codes(codes: &[Option<i32>]) -> Self {
        ScriptedRunner {
            codes: codes.iter().copied().collect(),
            ..Self::passing()
        }
    }

    /// raise `flag` while the `call`-th script (1-based) runs
    pub fn interrupt_on(mut self, call: usize, flag: InterruptFlag) -> Self {
        self.interrupt = Some((call, flag));
        self
    }
}

impl TestRunner for ScriptedRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<TestStatus> {
        self.calls.push(invocation.clone());
        if let Some((call, flag)) = &self.interrupt {
            if self.calls.len() == *call {
                flag.raise();
            }
        }
        let code = self.codes.pop_front().unwrap_or(Some(1));
        Ok(TestStatus {
            code,
            elapsed: self.elapsed,
        })
    }
}
