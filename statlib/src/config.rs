use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration of the cache-size sweep run for every input row
///
/// Every field is optional in JSON, missing fields take the defaults below
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Cache line size in bytes, used to turn cache sizes into a number of lines
    pub line_size: u64,
    /// Sizes, in bytes, of the cache levels below the swept one
    pub lower_levels: Vec<u64>,
    /// Remove the traffic captured by the lower levels before the sweep
    pub filter_lower_levels: bool,
    /// Size reported first, followed by the total access count at that point
    pub anchor_size: u64,
    /// First size of the doubling sweep
    pub smallest_size: u64,
    /// The sweep stops once the size grows past this
    pub largest_size: u64,
    /// Use destructive LRU solves throughout the sweep
    pub destructive_sweep: bool,
    /// Bucket loading stops at the first boundary at or beyond this reuse distance
    pub max_reuse_distance: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            line_size: 64,
            // 12-way, 4KiB per way L1
            lower_levels: vec![12 * 4 * 1024],
            filter_lower_levels: false,
            anchor_size: 512 * 1024,
            smallest_size: 1024 * 1024,
            largest_size: 8192 * 1024,
            destructive_sweep: false,
            max_reuse_distance: 4_227_858_432,
        }
    }
}

impl SweepConfig {
    /// Checks the values can drive a sweep, which needs non-zero sizes and lines
    pub fn validate(&self) -> Result<()> {
        if self.line_size == 0 {
            return Err(Error::InvalidConfig { field: "line_size", message: "must be greater than 0".to_string() });
        }
        if self.smallest_size == 0 {
            return Err(Error::InvalidConfig { field: "smallest_size", message: "must be greater than 0".to_string() });
        }
        if self.anchor_size < self.line_size {
            return Err(Error::InvalidConfig {
                field: "anchor_size",
                message: format!("must hold at least one {} byte line", self.line_size),
            });
        }
        if self.filter_lower_levels && self.lower_levels.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(Error::InvalidConfig {
                field: "lower_levels",
                message: "must be in ascending order when filtering".to_string(),
            });
        }
        if self.destructive_sweep && self.anchor_size > self.smallest_size {
            return Err(Error::InvalidConfig {
                field: "anchor_size",
                message: "must not exceed smallest_size when the sweep is destructive".to_string(),
            });
        }
        if self.destructive_sweep && self.filter_lower_levels && self.lower_levels.iter().any(|&size| size > self.anchor_size) {
            return Err(Error::InvalidConfig {
                field: "lower_levels",
                message: "must not exceed anchor_size when both the lower levels and the sweep are destructive".to_string(),
            });
        }
        Ok(())
    }

    /// Converts a size in bytes into whole cache lines
    pub fn lines(&self, size: u64) -> f64 {
        (size / self.line_size) as f64
    }
}
