use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SweepConfig;
use crate::error::Result;
use crate::histogram::Histogram;
use crate::io::HistogramReader;
use crate::report::{OutputFormat, ReportWriter};
use crate::solvers::{MissModel, RandomReplacement, StackDistance};

/// Generates the cache sizes of a sweep, from `start` up to and including `largest`
///
/// Sizes double each step. A checkpoint starts at twice `start`; a doubled size reaching it is
/// snapped to the checkpoint, which then doubles itself
///
/// # Examples
///
/// ```
/// use statlib::sweep::sweep_sizes;
/// assert_eq!(sweep_sizes(1024, 8192), vec![1024, 2048, 4096, 8192]);
/// ```
pub fn sweep_sizes(start: u64, largest: u64) -> Vec<u64> {
    let mut sizes = Vec::new();
    if start == 0 {
        return sizes;
    }
    let mut size = start;
    let mut checkpoint = start.saturating_mul(2);
    while size <= largest {
        sizes.push(size);
        size = size.saturating_mul(2);
        if size >= checkpoint {
            size = checkpoint;
            checkpoint = checkpoint.saturating_mul(2);
        }
        if size == u64::MAX {
            break;
        }
    }
    sizes
}

/// The estimates for one cache size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Cache size in bytes
    pub size: u64,
    pub random_miss_ratio: f64,
    pub lru_misses: u64,
}

/// The estimates for one input row. Can be serialised to the JSON output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowReport {
    pub id: String,
    /// False when the row's counts didn't line up with the bucket definition
    pub aligned: bool,
    pub anchor: SweepPoint,
    /// Total accesses left in the histogram once the anchor size was solved
    pub anchor_total_accesses: u64,
    pub points: Vec<SweepPoint>,
    pub total_accesses: u64,
}

/// Counters for a whole run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub misaligned_rows: usize,
}

/// Runs both solvers over the configured cache sizes for each histogram
pub struct Sweeper {
    config: SweepConfig,
    sizes: Vec<u64>,
    random: RandomReplacement,
    lru: StackDistance,
    solve_time: Duration,
}

impl Sweeper {
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.validate()?;
        let sizes = sweep_sizes(config.smallest_size, config.largest_size);
        Ok(Self {
            config,
            sizes,
            random: RandomReplacement::default(),
            lru: StackDistance,
            solve_time: Duration::new(0, 0),
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// The sizes swept after the anchor, in ascending order
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Gets the wall-clock time spent solving
    pub fn get_solve_time(&self) -> &Duration {
        &self.solve_time
    }

    fn point(&self, histogram: &mut Histogram, size: u64, destructive: bool) -> Result<SweepPoint> {
        let lines = self.config.lines(size);
        let random_miss_ratio = self.random.solve(histogram, lines);
        let lru_misses = self.lru.solve_with(histogram, lines, destructive)?;
        Ok(SweepPoint { size, random_miss_ratio, lru_misses })
    }

    /// Evaluates the lower levels, the anchor size and every sweep size against one histogram
    ///
    /// With `filter_lower_levels` or `destructive_sweep` set the histogram is filtered as it goes,
    /// so it must not be reused for another sweep afterwards
    ///
    /// # Arguments
    ///
    /// * `id`: The row identifier
    /// * `histogram`: The row's histogram
    ///
    /// returns: Result<RowReport, Error>
    pub fn run_row(&mut self, id: &str, histogram: &mut Histogram) -> Result<RowReport> {
        let start = Instant::now();
        let destructive = self.config.destructive_sweep;

        for &size in &self.config.lower_levels {
            let level = self.point(histogram, size, self.config.filter_lower_levels)?;
            debug!(
                row = id,
                size,
                random = level.random_miss_ratio,
                lru = level.lru_misses,
                remaining = histogram.total_accesses(),
                "lower level"
            );
        }

        let anchor = self.point(histogram, self.config.anchor_size, destructive)?;
        let anchor_total_accesses = histogram.total_accesses();

        let mut points = Vec::with_capacity(self.sizes.len());
        for &size in &self.sizes {
            points.push(self.point(histogram, size, destructive)?);
        }

        self.solve_time += start.elapsed();
        Ok(RowReport {
            id: id.to_string(),
            aligned: histogram.is_aligned(),
            anchor,
            anchor_total_accesses,
            points,
            total_accesses: histogram.total_accesses(),
        })
    }

    /// Solves every row of an input and writes the report
    ///
    /// The bucket definition line is read before anything is written, so an input without one
    /// produces no output at all
    ///
    /// # Arguments
    ///
    /// * `input`: The histogram input, bucket definition first
    /// * `format`: The report format
    /// * `out`: Where the report is written
    ///
    /// returns: Result<RunSummary, Error>
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, format: OutputFormat, out: W) -> Result<RunSummary> {
        let reader = HistogramReader::new(input, self.config.max_reuse_distance)?;
        debug!(buckets = reader.buckets().len(), "loaded bucket definition");
        let mut writer = ReportWriter::new(out, format, &self.config, &self.sizes)?;
        let mut summary = RunSummary::default();
        for row in reader {
            let (id, mut histogram) = row?;
            let report = self.run_row(&id, &mut histogram)?;
            summary.rows += 1;
            if !report.aligned {
                summary.misaligned_rows += 1;
            }
            writer.write_row(report)?;
        }
        writer.finish()?;
        info!(rows = summary.rows, misaligned = summary.misaligned_rows, "sweep finished");
        Ok(summary)
    }
}
