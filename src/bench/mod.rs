//! Benchmark driver comparing the three engines on a real `key,value` dataset.
//!
//! [`dataset`] reads the input, [`runner`] times every engine across a matrix of sizes and
//! load factors, [`report`] writes the measurements as CSV and SVG charts.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::error::MapError;

pub mod dataset;
pub mod report;
pub mod runner;

/// Load factors every engine is measured at.
pub const LOAD_FACTORS: [f64; 5] = [0.75, 0.80, 0.90, 0.95, 0.99];

/// Entry counts every engine is measured at.
pub const SIZES: [usize; 13] =
    [50, 100, 250, 500, 1000, 5000, 10000, 15000, 30000, 50000, 75000, 100_000, 150_000];

/// Failures of the benchmark driver.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Reading the dataset or writing a report failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A dataset line could not be parsed
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the dataset file
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The dataset holds a header but no records
    #[error("dataset contains no records")]
    EmptyDataset,

    /// Rendering a chart failed
    #[error("failed to draw chart {path}: {reason}")]
    Chart {
        /// Chart file being drawn
        path: PathBuf,
        /// Message reported by the drawing backend
        reason: String,
    },

    /// A matrix cell asked for a map the engines refuse to build
    #[error(transparent)]
    Map(#[from] MapError),

    /// The command line was not understood
    #[error("usage: {0}")]
    Usage(String),
}

/// Knobs of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Load factors to measure at
    pub load_factors: Vec<f64>,
    /// Entry counts to measure at; counts above the dataset size are skipped
    pub sizes: Vec<usize>,
    /// Key looked up by the failed-lookup measurement, expected to be absent from the dataset
    pub missing_key: String,
    /// Directory the CSV and charts are written to
    pub output_dir: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            load_factors: LOAD_FACTORS.to_vec(),
            sizes: SIZES.to_vec(),
            missing_key: "im-not-existing".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}
