//! the regression loop: run both flows per point, extract, accumulate

use std::time::Duration;

use eyre::Result;
use tracing::{error, info, info_span, warn};

use crate::{
    configuration::{ArithMode, Configuration},
    extract::{extract_data, ExecTimes, ReportPaths},
    interrupt::InterruptFlag,
    report::Report,
    savings::round_to,
    settings::{ExecTimeSource, Settings},
    sweep,
    toolchain::{Invocation, TestRunner, Toolchain},
};

/// how a sweep ended; none of these is an error of the harness itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed {
        points: usize,
    },
    /// a test script did not report success
    Failed {
        index: usize,
        toolchain: Toolchain,
        mode: ArithMode,
    },
    Interrupted {
        points: usize,
    },
}

impl SweepOutcome {
    pub fn exit_code(&self, interrupt_exit_code: i32) -> i32 {
        match self {
            SweepOutcome::Completed { .. } => 0,
            SweepOutcome::Failed { .. } => 1,
            SweepOutcome::Interrupted { .. } => interrupt_exit_code,
        }
    }
}

enum Step {
    Passed(Duration),
    Failed,
    Interrupted,
}

pub struct Driver<'a, R: TestRunner> {
    settings: &'a Settings,
    runner: R,
    interrupt: InterruptFlag,
    report: Report,
    /// set once the first point passed both flows
    success: bool,
}

impl<'a, R: TestRunner> Driver<'a, R> {
    pub fn new(settings: &'a Settings, runner: R, interrupt: InterruptFlag) -> Self {
        Driver {
            settings,
            runner,
            interrupt,
            report: Report::new(settings.variant.signs),
            success: false,
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&mut self) -> Result<SweepOutcome> {
        let settings = self.settings;
        let points = sweep::enumerate(&settings.sweep, &settings.variant)?;
        info!("{} configuration sets to run", points.len());

        for config in &points {
            if self.interrupt.is_raised() {
                return self.interrupted();
            }
            let _span = info_span!("config", index = config.index).entered();
            log_banner(config);

            let hls_elapsed = match self.call(Invocation::hls(
                config,
                settings.tests.name(config.mode()),
                settings.variant.signs,
                &settings.paths.hls_tb(),
            ))? {
                Step::Passed(elapsed) => elapsed,
                Step::Failed => return self.failed(config, Toolchain::Hls),
                Step::Interrupted => return self.interrupted(),
            };
            let rtl_elapsed = match self.call(Invocation::rtl(
                config,
                settings.tests.name(config.mode()),
                settings.variant.signs,
                &settings.paths.rtl_tb(),
            ))? {
                Step::Passed(elapsed) => elapsed,
                Step::Failed => return self.failed(config, Toolchain::Rtl),
                Step::Interrupted => return self.interrupted(),
            };
            self.success = true;

            self.record(config, hls_elapsed, rtl_elapsed)?;
            info!("RTL and Synthesis complete");
        }

        self.flush()?;
        Ok(SweepOutcome::Completed {
            points: self.report.len(),
        })
    }

    fn call(&mut self, invocation: Invocation) -> Result<Step> {
        let status = self.runner.run(&invocation)?;
        if self.interrupt.is_raised() {
            return Ok(Step::Interrupted);
        }
        if !status.passed() {
            return Ok(Step::Failed);
        }
        Ok(Step::Passed(status.elapsed))
    }

    fn record(
        &mut self,
        config: &Configuration,
        hls_elapsed: Duration,
        rtl_elapsed: Duration,
    ) -> Result<()> {
        let settings = self.settings;
        let test_name = settings.tests.name(config.mode());
        let paths = ReportPaths::new(
            &settings.paths.hls_tb(),
            &settings.paths.mvau_rtl_root,
            test_name,
            &settings.tests.rtl_run,
        );
        let exec = match settings.variant.exec_time {
            ExecTimeSource::Report => ExecTimes::Reports,
            ExecTimeSource::WallClock => ExecTimes::Measured {
                hls: round_to(hls_elapsed.as_secs_f64(), 3),
                rtl: round_to(rtl_elapsed.as_secs_f64(), 3),
            },
        };
        let row = extract_data(
            &paths,
            settings.variant.clock_period,
            settings.variant.latency_layout,
            exec,
        )?;
        self.report.record(config, row);
        Ok(())
    }

    fn failed(&mut self, config: &Configuration, toolchain: Toolchain) -> Result<SweepOutcome> {
        let mode = config.mode();
        error!("{} {} Test Failed", toolchain, mode.describe());
        if self.success {
            self.flush()?;
        }
        Ok(SweepOutcome::Failed {
            index: config.index,
            toolchain,
            mode,
        })
    }

    fn interrupted(&mut self) -> Result<SweepOutcome> {
        warn!(
            "sweep interrupted after {} configuration sets",
            self.report.len()
        );
        if self.success {
            self.flush()?;
        }
        Ok(SweepOutcome::Interrupted {
            points: self.report.len(),
        })
    }

    fn flush(&self) -> Result<()> {
        let report_settings = &self.settings.report;
        self.report.write_xlsx(&report_settings.out_file)?;
        if report_settings.json {
            self.report.save_json(&report_settings.out_file)?;
        }
        Ok(())
    }
}

fn log_banner(config: &Configuration) {
    info!("#######################################");
    info!("### MVAU Configuration Set: {}", config.index);
    info!("### IFM Channels: {}", config.ifm_ch);
    info!("### IFM Dimensions: {}", config.ifm_dim);
    info!("### OFM Channels: {}", config.ofm_ch);
    info!("### Kernel Dimensions: {}", config.kdim);
    info!("### Input precision: {}", config.inp_wl);
    info!("### Weight precision: {}", config.wgt_wl);
    info!("### Output precision: {}", config.out_wl);
    info!("### SIMD: {}", config.simd);
    info!("### PE: {}", config.pe);
    info!("### Mode: {}", config.mode().describe());
    info!("#######################################");
}
