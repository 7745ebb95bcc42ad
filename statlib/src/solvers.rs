use crate::error::Result;
use crate::histogram::Histogram;

/// A generic trait for analytic miss models. Each model turns a histogram and a cache capacity
/// into an estimate of how badly that cache would miss
pub trait MissModel {
    /// What the model reports, a ratio for some models and an absolute count for others
    type Output;

    /// Estimates the misses of a fully associative cache
    ///
    /// # Arguments
    ///
    /// * `histogram`: The reuse-distance histogram of the trace
    /// * `lines`: The capacity of the cache in cache lines
    ///
    /// returns: Self::Output
    fn solve(&self, histogram: &Histogram, lines: f64) -> Self::Output;
}

/// Below this hit probability the remaining buckets are counted as certain misses
const HIT_PROBABILITY_CUTOFF: f64 = 0.000001;

/// Random replacement, solved with the StatCache expected-miss equation
///
/// For a miss ratio `r`, an access with reuse distance `d` survives `r * d` random evictions, each
/// of which keeps its line with probability `(L - 1) / L`. The miss ratio is the `r` for which the
/// expected number of misses equals `r * total_accesses`, found by bisection
#[derive(Debug, Clone, Copy)]
pub struct RandomReplacement {
    /// Lower end of the bisection interval, treated as a 0% miss ratio
    pub min_ratio: f64,
    /// Upper end of the bisection interval, treated as a 100% miss ratio
    pub max_ratio: f64,
    /// Bisection stops once the bracket is at most this wide
    pub tolerance: f64,
}

impl Default for RandomReplacement {
    fn default() -> Self {
        Self {
            min_ratio: 0.0001,
            max_ratio: 0.9999,
            tolerance: 0.0001,
        }
    }
}

impl RandomReplacement {
    /// Expected number of misses for a candidate miss ratio `r`
    ///
    /// The base factor is computed once and raised to each bucket boundary. Once the hit
    /// probability falls to the cutoff every remaining access is taken as a miss straight from the
    /// cumulative histogram, avoiding underflow in the tail
    pub fn expected_misses(&self, histogram: &Histogram, r: f64, lines: f64) -> f64 {
        let boundaries = histogram.buckets().boundaries();
        let counts = histogram.counts();
        let cumulative = histogram.cumulative();
        let factor = ((lines - 1.0) / lines).powf(r);

        let mut sum = 0.0;
        let mut hit_probability = 1.0;
        let mut bucket = 0;
        while bucket < counts.len() && hit_probability > HIT_PROBABILITY_CUTOFF {
            hit_probability = factor.powf(boundaries[bucket] as f64);
            sum += counts[bucket] as f64 * (1.0 - hit_probability);
            bucket += 1;
        }
        // Tail past the cutoff, certain misses
        if bucket > 0 {
            sum += (histogram.total_accesses() - cumulative[bucket - 1]) as f64;
        }
        sum
    }
}

impl MissModel for RandomReplacement {
    type Output = f64;

    /// Returns the miss ratio, in `[0, 1]`
    ///
    /// An empty histogram never misses. A cache of less than one line (or a non-finite capacity)
    /// can't hold anything and always misses
    fn solve(&self, histogram: &Histogram, lines: f64) -> f64 {
        let total = histogram.total_accesses() as f64;
        if histogram.total_accesses() == 0 {
            return 0.0;
        }
        if !lines.is_finite() || lines < 1.0 {
            return 1.0;
        }

        let mut r_max = self.max_ratio;
        let mut r_min = self.min_ratio;
        if self.expected_misses(histogram, r_max, lines) >= total * r_max {
            return 1.0;
        }
        if self.expected_misses(histogram, r_min, lines) < total * r_min {
            return 0.0;
        }
        while r_max - r_min > self.tolerance {
            let r_mid = (r_max + r_min) / 2.0;
            if self.expected_misses(histogram, r_mid, lines) < r_mid * total {
                r_max = r_mid;
            } else {
                r_min = r_mid;
            }
        }
        (r_max + r_min) / 2.0
    }
}

/// LRU, solved by turning the reuse-distance histogram into a stack-distance estimate (StatStack)
///
/// The cache holds every block referenced within the window whose expected number of unique
/// blocks fits into it, so everything up to that bucket hits
#[derive(Debug, Default, Clone, Copy)]
pub struct StackDistance;

/// Outcome of the bucket search, before any filtering
enum Capture {
    /// The first bucket alone already overflows the cache
    Overflow,
    /// Everything up to and including this bucket hits
    UpTo(usize),
}

impl StackDistance {
    /// Expected number of unique blocks referenced within the window ending at bucket `index`
    ///
    /// Assumed non-decreasing in `index`, the search in [`StackDistance::solve`] relies on it
    pub fn unique_occurrences(&self, histogram: &Histogram, index: usize) -> f64 {
        let buckets = histogram.buckets();
        let cumulative = histogram.cumulative();
        let total = histogram.total_accesses() as f64;
        let mut sum = 0.0;
        for (i, &running) in cumulative.iter().enumerate().take(index + 1) {
            sum += buckets.window(i) as f64 * (total - running as f64);
        }
        sum / total
    }

    fn capture(&self, histogram: &Histogram, lines: f64) -> Capture {
        let mut low = 0;
        let mut high = histogram.len() - 1;
        // Cache larger than the working set
        if self.unique_occurrences(histogram, high) <= lines {
            low = high;
        }
        if self.unique_occurrences(histogram, low) >= lines {
            return Capture::Overflow;
        }
        while high - low > 1 {
            let middle = (low + high) / 2;
            if self.unique_occurrences(histogram, middle) > lines {
                high = middle;
            } else {
                low = middle;
            }
        }
        Capture::UpTo(low)
    }

    /// Solves like [`MissModel::solve`], then drops the accesses this cache captured from the
    /// histogram so the next, larger level only sees what missed here
    ///
    /// Calls on one histogram must use non-decreasing capacities, a smaller capacity than the
    /// previous destructive call is rejected and leaves the histogram untouched. So is a non-finite
    /// capacity
    ///
    /// # Arguments
    ///
    /// * `histogram`: The histogram to solve against and filter
    /// * `lines`: The capacity of this cache level in cache lines
    ///
    /// returns: Result<u64, Error>, the miss count of this level
    pub fn solve_destructive(&self, histogram: &mut Histogram, lines: f64) -> Result<u64> {
        histogram.check_ascending(lines)?;
        if histogram.total_accesses() == 0 || histogram.is_empty() {
            histogram.note_destructive(lines);
            return Ok(0);
        }
        let total = histogram.total_accesses();
        match self.capture(histogram, lines) {
            Capture::Overflow => {
                histogram.note_destructive(lines);
                Ok(total)
            }
            Capture::UpTo(low) => {
                let hits = histogram.cumulative()[low];
                histogram.drop_captured(low, hits, lines);
                Ok(total - hits)
            }
        }
    }

    /// Dispatches on `destructive`, mirroring the single-call form of the solver
    pub fn solve_with(&self, histogram: &mut Histogram, lines: f64, destructive: bool) -> Result<u64> {
        if destructive {
            self.solve_destructive(histogram, lines)
        } else {
            Ok(self.solve(histogram, lines))
        }
    }
}

impl MissModel for StackDistance {
    type Output = u64;

    /// Returns the miss count, in `[0, total_accesses]`
    ///
    /// When the first bucket alone doesn't fit, this returns `total_accesses`: the search found
    /// the cache "already full" at bucket 0. A non-finite capacity is treated as a certain miss
    /// too, the same way [`RandomReplacement`] answers 1.0 for it
    fn solve(&self, histogram: &Histogram, lines: f64) -> u64 {
        let total = histogram.total_accesses();
        if total == 0 || histogram.is_empty() {
            return 0;
        }
        if !lines.is_finite() {
            return total;
        }
        match self.capture(histogram, lines) {
            Capture::Overflow => total,
            Capture::UpTo(low) => total - histogram.cumulative()[low],
        }
    }
}
