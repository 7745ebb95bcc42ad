use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};

/// The reuse-distance boundaries shared by every histogram of an input
///
/// Loaded once from the header of the input and never mutated afterwards, so it is handed out to
/// each row's histogram behind an `Arc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    boundaries: Vec<u64>,
    diffs: Vec<u64>,
}

impl Buckets {
    /// Creates a bucket definition from strictly increasing boundaries
    ///
    /// `diffs[0]` is defined as 1, every other entry is the distance to the previous boundary
    ///
    /// # Arguments
    ///
    /// * `boundaries`: The reuse distances at which each bucket starts
    ///
    /// returns: Result<Buckets, Error>
    pub fn new(boundaries: Vec<u64>) -> Result<Self> {
        if boundaries.is_empty() {
            return Err(Error::EmptyBuckets);
        }
        let mut diffs = Vec::with_capacity(boundaries.len());
        diffs.push(1);
        for pair in boundaries.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::UnorderedBuckets { previous: pair[0], next: pair[1] });
            }
            diffs.push(pair[1] - pair[0]);
        }
        Ok(Self { boundaries, diffs })
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn boundaries(&self) -> &[u64] {
        &self.boundaries
    }

    pub fn diffs(&self) -> &[u64] {
        &self.diffs
    }

    /// Width of the reuse-distance window starting at `index`, i.e. `b[index + 1] - b[index]`
    ///
    /// The last bucket has no upper neighbour, so its window is empty
    pub fn window(&self, index: usize) -> u64 {
        self.diffs.get(index + 1).copied().unwrap_or(0)
    }
}

/// The reuse-distance histogram of a single input row
///
/// Owned by the row being processed. The LRU solver may rewrite it in place to drop the accesses
/// a lower cache level has already absorbed, see [`crate::solvers::StackDistance::solve_destructive`]
#[derive(Debug, Clone)]
pub struct Histogram {
    buckets: Arc<Buckets>,
    counts: Vec<u64>,
    cumulative: Vec<u64>,
    total_accesses: u64,
    filter_boundary: Option<usize>,
    last_destructive_lines: Option<f64>,
}

impl Histogram {
    /// Builds a histogram from per-bucket counts, computing the cumulative sums and total
    ///
    /// Counts beyond the number of buckets are ignored. Fewer counts than buckets are kept as is,
    /// check [`Histogram::is_aligned`] before trusting results for such a row. A row whose total
    /// would overflow is cut short at the bucket where it does, leaving it misaligned too
    pub fn new(buckets: Arc<Buckets>, counts: &[u64]) -> Self {
        let mut counts: Vec<u64> = counts.iter().copied().take(buckets.len()).collect();
        let mut cumulative = Vec::with_capacity(counts.len());
        let mut running = 0u64;
        for (index, &count) in counts.iter().enumerate() {
            match running.checked_add(count) {
                Some(next) => running = next,
                None => {
                    warn!(bucket = index, "access count overflows at this bucket, dropping the rest of the row");
                    break;
                }
            }
            cumulative.push(running);
        }
        counts.truncate(cumulative.len());
        Self {
            buckets,
            counts,
            cumulative,
            total_accesses: running,
            filter_boundary: None,
            last_destructive_lines: None,
        }
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn cumulative(&self) -> &[u64] {
        &self.cumulative
    }

    pub fn total_accesses(&self) -> u64 {
        self.total_accesses
    }

    /// Number of buckets actually loaded for this row
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Whether the row has exactly one count per bucket
    pub fn is_aligned(&self) -> bool {
        self.counts.len() == self.buckets.len() && self.cumulative.len() == self.buckets.len()
    }

    /// The bucket index recorded by the most recent destructive solve, if any
    pub fn filter_boundary(&self) -> Option<usize> {
        self.filter_boundary
    }

    /// Capacity, in lines, of the most recent destructive solve, if any
    pub fn last_destructive_lines(&self) -> Option<f64> {
        self.last_destructive_lines
    }

    /// Checks a destructive solve at `lines` has a finite capacity which doesn't go back down
    pub(crate) fn check_ascending(&self, lines: f64) -> Result<()> {
        if !lines.is_finite() {
            return Err(Error::InvalidCapacity { lines });
        }
        match self.last_destructive_lines {
            Some(previous) if lines < previous => Err(Error::NonAscendingCapacity { previous, requested: lines }),
            _ => Ok(()),
        }
    }

    /// Removes every access up to and including bucket `low` from the histogram
    ///
    /// `hits` must be `cumulative[low]` as it was before the call. Afterwards the histogram only
    /// holds the traffic which missed a cache capturing those buckets, and the total is updated so
    /// `sum(counts) == cumulative[last] == total_accesses` still holds
    pub(crate) fn drop_captured(&mut self, low: usize, hits: u64, lines: f64) {
        debug_assert_eq!(self.cumulative[low], hits);
        for i in 0..low {
            self.counts[i] = 0;
            self.cumulative[i] = 0;
        }
        for cumulative in &mut self.cumulative[low..] {
            *cumulative -= hits;
        }
        self.counts[low] = 0;
        self.total_accesses = self.cumulative.last().copied().unwrap_or(0);
        self.filter_boundary = Some(low);
        self.last_destructive_lines = Some(lines);
    }

    /// Records a destructive solve which captured nothing it could remove
    pub(crate) fn note_destructive(&mut self, lines: f64) {
        self.last_destructive_lines = Some(lines);
    }
}

/// Loads rows against a shared bucket definition, reporting misaligned rows as it goes
#[derive(Debug)]
pub struct HistogramStore {
    buckets: Arc<Buckets>,
    last_row_len: Option<usize>,
}

impl HistogramStore {
    pub fn new(buckets: Buckets) -> Self {
        Self {
            buckets: Arc::new(buckets),
            last_row_len: None,
        }
    }

    /// Replaces the bucket definition
    ///
    /// A definition whose length differs from the last loaded row is reported but still installed
    pub fn set_buckets(&mut self, boundaries: Vec<u64>) -> Result<()> {
        let buckets = Buckets::new(boundaries)?;
        if let Some(row_len) = self.last_row_len {
            if row_len != buckets.len() {
                warn!(buckets = buckets.len(), row = row_len, "bucket definition length differs from the last loaded row");
            }
        }
        self.buckets = Arc::new(buckets);
        Ok(())
    }

    pub fn buckets(&self) -> &Arc<Buckets> {
        &self.buckets
    }

    /// Creates the histogram for one row
    ///
    /// A row whose count list doesn't match the bucket definition is a data-integrity failure:
    /// it's reported and the histogram is built from whatever was parsed
    ///
    /// # Arguments
    ///
    /// * `id`: The row identifier, only used for diagnostics
    /// * `counts`: The per-bucket access counts
    ///
    /// returns: Histogram
    pub fn load_row(&mut self, id: &str, counts: &[u64]) -> Histogram {
        let histogram = Histogram::new(Arc::clone(&self.buckets), counts);
        if !histogram.is_aligned() {
            warn!(
                row = id,
                histogram = histogram.len(),
                buckets = self.buckets.len(),
                "histogram size doesn't match the bucket definition, results for this row are unreliable"
            );
        }
        self.last_row_len = Some(histogram.len());
        histogram
    }
}
