use std::io::Write;

use crate::config::SweepConfig;
use crate::error::Result;
use crate::sweep::RowReport;

/// Output formats for the report
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One header line, then one line per row
    #[default]
    Csv,
    /// A pretty printed array of row reports, written once every row is solved
    Json,
}

/// Builds the CSV header for an anchor size followed by the swept sizes
///
/// Columns are named after the cache size in KiB
///
/// # Examples
///
/// ```
/// use statlib::report::csv_header;
/// assert_eq!(
///     csv_header(512 * 1024, &[1024 * 1024]),
///     "id,random_512,lru_512,total_accesses_512,random_1024,lru_1024,total_accesses"
/// );
/// ```
pub fn csv_header(anchor_size: u64, sizes: &[u64]) -> String {
    let anchor = anchor_size / 1024;
    let mut header = format!("id,random_{anchor},lru_{anchor},total_accesses_{anchor},");
    for size in sizes {
        let kib = size / 1024;
        header.push_str(&format!("random_{kib},lru_{kib},"));
    }
    header.push_str("total_accesses");
    header
}

/// Formats one row of the CSV report, miss ratios with six decimals
pub fn csv_row(report: &RowReport) -> String {
    let mut line = format!(
        "{},{:.6},{},{},",
        report.id, report.anchor.random_miss_ratio, report.anchor.lru_misses, report.anchor_total_accesses
    );
    for point in &report.points {
        line.push_str(&format!("{:.6},{},", point.random_miss_ratio, point.lru_misses));
    }
    line.push_str(&report.total_accesses.to_string());
    line
}

/// Writes row reports as they're produced
pub struct ReportWriter<W: Write> {
    out: W,
    format: OutputFormat,
    pending: Vec<RowReport>,
}

impl<W: Write> ReportWriter<W> {
    /// Creates the writer, emitting the CSV header straight away
    pub fn new(mut out: W, format: OutputFormat, config: &SweepConfig, sizes: &[u64]) -> Result<Self> {
        if format == OutputFormat::Csv {
            writeln!(out, "{}", csv_header(config.anchor_size, sizes))?;
        }
        Ok(Self { out, format, pending: Vec::new() })
    }

    pub fn write_row(&mut self, report: RowReport) -> Result<()> {
        match self.format {
            OutputFormat::Csv => writeln!(self.out, "{}", csv_row(&report))?,
            OutputFormat::Json => self.pending.push(report),
        }
        Ok(())
    }

    /// Flushes the report, for JSON this is where the rows are actually written
    pub fn finish(mut self) -> Result<W> {
        if self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.out, &self.pending)?;
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
