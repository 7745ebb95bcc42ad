//! # StatLib
//!
//! Statlib estimates cache miss ratios from reuse-distance histograms, without replaying the
//! trace the histograms were collected from
//!
//! It provides two analytic solvers, random replacement and LRU, and a driver which sweeps both
//! over a range of cache sizes for every histogram in an input file. The LRU solver can also
//! filter a histogram in place, which chains inclusive cache levels together

/// Contains the error type shared by the library
pub mod error;

/// Contains the bucket definition and the per-row reuse-distance histogram
pub mod histogram;

/// Contains the random replacement and LRU stack-distance solvers, with a trait for miss models
pub mod solvers;

/// Contains the JSON configuration of a sweep
pub mod config;

/// Contains the sweep driver used to solve every row of an input
pub mod sweep;

/// Contains input reading and parsing of the histogram file format
pub mod io;

/// Contains the CSV and JSON report writers
pub mod report;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
