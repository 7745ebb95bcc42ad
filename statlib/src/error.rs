use thiserror::Error;

/// Errors raised while loading histograms or solving against them
#[derive(Debug, Error)]
pub enum Error {
    #[error("Couldn't read the input: {0}")]
    Io(#[from] std::io::Error),

    #[error("The input has no bucket definition line")]
    MissingHeader,

    #[error("Couldn't parse bucket boundary {index} ('{token}')")]
    InvalidBoundary { index: usize, token: String },

    #[error("The bucket definition is empty")]
    EmptyBuckets,

    #[error("Bucket boundaries must be strictly increasing, found {previous} followed by {next}")]
    UnorderedBuckets { previous: u64, next: u64 },

    #[error("Destructive solves must use non-decreasing capacities, got {requested} lines after {previous}")]
    NonAscendingCapacity { previous: f64, requested: f64 },

    #[error("Destructive solves need a finite capacity, got {lines} lines")]
    InvalidCapacity { lines: f64 },

    #[error("Couldn't serialise the report: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfig { field: &'static str, message: String },
}

/// A specialised `Result` for histogram loading and solving
pub type Result<T, E = Error> = std::result::Result<T, E>;
