use calamine::{open_workbook, Data, Reader, Xlsx};
use eyre::Result;
use mvau_regtest::{
    configuration::Configuration,
    report::{MetricRow, Report, ToolchainMetrics, CONFIG_SHEET, METRICS_SHEET, METRIC_COLUMNS},
};

fn config(index: usize, inp_wl: u32, wgt_wl: u32) -> Configuration {
    Configuration {
        index,
        ifm_ch: 600,
        ifm_dim: 1,
        ofm_ch: 64,
        kdim: 1,
        inp_wl,
        inp_signed: false,
        wgt_wl,
        wgt_signed: true,
        out_wl: 11,
        simd: 600,
        pe: 64,
    }
}

fn metrics(lut: u64) -> ToolchainMetrics {
    ToolchainMetrics {
        lut,
        ff: 1200,
        dsp: 0,
        bram: 4,
        clock_period: 4.321,
        latency: 97,
        exec_time: 512.75,
    }
}

#[test]
fn two_sheets_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mvau_report.xlsx");
    let mut report = Report::new(true);
    report.record(&config(0, 2, 2), MetricRow::new(metrics(900), metrics(700)));
    report.record(&config(1, 1, 1), MetricRow::new(metrics(300), metrics(310)));
    report.write_xlsx(&path)?;

    let mut workbook: Xlsx<_> = open_workbook(&path)?;
    assert_eq!(workbook.sheet_names(), [METRICS_SHEET, CONFIG_SHEET]);

    let metrics_sheet = workbook.worksheet_range(METRICS_SHEET)?;
    assert_eq!(metrics_sheet.height(), 1 + 2);
    let header = metrics_sheet.rows().next().unwrap_or_default();
    let savings = header
        .iter()
        .filter(|cell| **cell == Data::String("%".to_string()))
        .count();
    assert_eq!(savings, METRIC_COLUMNS.len() / 2);
    assert_eq!(
        metrics_sheet.get((2, 0)),
        Some(&Data::String("Config set: 1 (XNOR)".to_string()))
    );

    let config_sheet = workbook.worksheet_range(CONFIG_SHEET)?;
    assert_eq!(config_sheet.height(), 1 + 2);
    // label, then IFM_Ch ... PE with both sign columns
    assert_eq!(config_sheet.width(), 1 + 11);
    assert_eq!(config_sheet.get((1, 1)), Some(&Data::Float(600.0)));
    assert_eq!(config_sheet.get((2, 0)), Some(&Data::String("1".to_string())));
    Ok(())
}

#[test]
fn rewriting_replaces_the_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("report.xlsx");
    let mut report = Report::new(false);
    report.write_xlsx(&path)?;
    report.record(&config(0, 2, 2), MetricRow::new(metrics(900), metrics(700)));
    report.write_xlsx(&path)?;

    let mut workbook: Xlsx<_> = open_workbook(&path)?;
    let range = workbook.worksheet_range(METRICS_SHEET)?;
    assert_eq!(range.height(), 2);
    Ok(())
}

#[test]
fn unwritable_path_is_an_error() {
    let report = Report::new(false);
    let dir = tempfile::tempdir().unwrap();
    // a directory cannot be replaced by the workbook
    assert!(report.write_xlsx(dir.path()).is_err());
}
