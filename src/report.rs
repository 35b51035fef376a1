//! the accumulated comparison and its two-sheet workbook

use std::path::Path;

use eyre::{Context, Result};
use itertools::Itertools;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use tracing::{error, info};

use crate::{configuration::Configuration, savings::calc_savings};

pub const METRICS_SHEET: &str = "HLS v RTL";
pub const CONFIG_SHEET: &str = "Config Set";

pub const METRIC_COLUMNS: [&str; 14] = [
    "HLS LUT",
    "HLS FF",
    "HLS DSPs",
    "HLS BRAM",
    "HLS Time",
    "HLS Latency",
    "HLS Exec. Time",
    "RTL LUT",
    "RTL FF",
    "RTL DSPs",
    "RTL BRAM",
    "RTL Time",
    "RTL Latency",
    "RTL Exec. Time",
];
pub const SAVING_COLUMN: &str = "%";

const LABEL_WIDTH: f64 = 24.0;
const WIDTH_PADDING: usize = 4;

/// the seven figures one toolchain reports for a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToolchainMetrics {
    pub lut: u64,
    pub ff: u64,
    pub dsp: u64,
    pub bram: u64,
    /// achieved period for HLS, remaining margin for RTL
    pub clock_period: f64,
    pub latency: u64,
    pub exec_time: f64,
}

impl ToolchainMetrics {
    /// `block` holds LUT, FF, DSP and BRAM in that order
    pub fn from_block(block: [u64; 4], clock_period: f64, latency: u64, exec_time: f64) -> Self {
        let [lut, ff, dsp, bram] = block;
        ToolchainMetrics {
            lut,
            ff,
            dsp,
            bram,
            clock_period,
            latency,
            exec_time,
        }
    }

    pub fn values(&self) -> [f64; 7] {
        [
            self.lut as f64,
            self.ff as f64,
            self.dsp as f64,
            self.bram as f64,
            self.clock_period,
            self.latency as f64,
            self.exec_time,
        ]
    }

    fn cells(&self) -> [Cell; 7] {
        [
            Cell::Int(self.lut),
            Cell::Int(self.ff),
            Cell::Int(self.dsp),
            Cell::Int(self.bram),
            Cell::Float(self.clock_period),
            Cell::Int(self.latency),
            Cell::Float(self.exec_time),
        ]
    }
}

/// HLS figures, RTL figures and the savings between them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub hls: ToolchainMetrics,
    pub rtl: ToolchainMetrics,
    pub savings: Vec<f64>,
}

impl MetricRow {
    pub fn new(hls: ToolchainMetrics, rtl: ToolchainMetrics) -> Self {
        let savings = calc_savings(&hls.values(), &rtl.values());
        MetricRow { hls, rtl, savings }
    }

    /// the 21 cells of the row in sheet order
    pub fn cells(&self) -> Vec<Cell> {
        self.hls
            .cells()
            .into_iter()
            .chain(self.rtl.cells())
            .chain(self.savings.iter().map(|&s| Cell::Float(s)))
            .collect_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Int(u64),
    Float(f64),
}

impl Cell {
    pub fn text(&self) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => format!("{:?}", v),
        }
    }

    fn number(&self) -> f64 {
        match *self {
            Cell::Int(v) => v as f64,
            Cell::Float(v) => v,
        }
    }
}

/// `Config set: N (MODE)`
pub fn report_key(config: &Configuration) -> String {
    format!("Config set: {} ({})", config.index, config.mode().tag())
}

/// the metric columns followed by one `%` column per compared metric
pub fn metric_headers() -> Vec<String> {
    let savings = METRIC_COLUMNS.len() / 2;
    METRIC_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::repeat(SAVING_COLUMN.to_string()).take(savings))
        .collect_vec()
}

/// width of each of the first `count` columns: the longest value or the
/// header, whichever is longer, plus padding
pub fn column_widths(headers: &[String], rows: &[Vec<Cell>], count: usize) -> Vec<usize> {
    headers
        .iter()
        .take(count)
        .enumerate()
        .map(|(col, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.text().len())
                .max()
                .unwrap_or(0);
            longest.max(header.len()) + WIDTH_PADDING
        })
        .collect_vec()
}

/// the two sweep accumulators, appended to once per successful point
#[derive(Debug, Default, Serialize)]
pub struct Report {
    signs: bool,
    rows: Vec<(String, MetricRow)>,
    configs: Vec<Configuration>,
}

impl Report {
    pub fn new(signs: bool) -> Self {
        Report {
            signs,
            ..Default::default()
        }
    }

    pub fn record(&mut self, config: &Configuration, row: MetricRow) {
        self.rows.push((report_key(config), row));
        self.configs.push(config.clone());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[(String, MetricRow)] {
        &self.rows
    }

    pub fn configs(&self) -> &[Configuration] {
        &self.configs
    }

    /// write both sheets to `path`, replacing any previous file
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        info!("Writing the results to an Excel file");
        self.build_workbook(path).map_err(|e| {
            error!("Cannot write to Excel output file {:?}", path);
            e
        })
    }

    fn build_workbook(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut workbook = Workbook::new();

        let headers = metric_headers();
        let cells = self.rows.iter().map(|(_, row)| row.cells()).collect_vec();
        let sheet = workbook.add_worksheet();
        sheet.set_name(METRICS_SHEET)?;
        write_header(sheet, &headers)?;
        for (i, ((key, _), row)) in self.rows.iter().zip(&cells).enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, key)?;
            for (c, cell) in row.iter().enumerate() {
                sheet.write_number(r, c as u16 + 1, cell.number())?;
            }
        }
        sheet.set_column_width(0, LABEL_WIDTH)?;
        for (c, width) in column_widths(&headers, &cells, METRIC_COLUMNS.len())
            .into_iter()
            .enumerate()
        {
            sheet.set_column_width(c as u16 + 1, width as f64)?;
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name(CONFIG_SHEET)?;
        write_header(sheet, &Configuration::column_names(self.signs))?;
        for (i, config) in self.configs.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, config.index.to_string())?;
            for (c, value) in config.sheet_values(self.signs).into_iter().enumerate() {
                sheet.write_number(r, c as u16 + 1, value as f64)?;
            }
        }

        workbook
            .save(path)
            .wrap_err_with(|| format!("fail to save the workbook {:?}", path))?;
        Ok(())
    }

    /// dump the accumulators as pretty json next to the workbook
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let path = path.with_extension("json");
        let mut file = std::fs::File::create(&path).wrap_err("fail to create json file")?;
        serde_json::to_writer_pretty(&mut file, self).wrap_err("fail to write json file")?;
        Ok(())
    }
}

/// header row, the first column is left for the row labels
fn write_header(sheet: &mut Worksheet, headers: &[String]) -> Result<()> {
    for (c, header) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16 + 1, header)?;
    }
    Ok(())
}
