//! Result sink traits and types
//!
//! This module defines the trait interface for result sinks and the output formats
//! they implement.

use crate::model::Review;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Supported output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON document with nested review objects
    Json,

    /// One flattened CSV row per review
    Csv,
}

impl OutputFormat {
    /// The file extension the format is written with
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "structured" => Ok(Self::Json),
            "csv" | "tabular" => Ok(Self::Csv),
            other => Err(OutputError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Trait for result sinks
///
/// A sink encodes the accumulated reviews of a finished crawl. It is handed the
/// reviews once, after the crawl has ended.
pub trait ResultSink {
    /// The format this sink produces
    fn format(&self) -> OutputFormat;

    /// Encodes `reviews` into `out`
    ///
    /// # Arguments
    ///
    /// * `reviews` - The retained reviews, in crawl order
    /// * `out` - Where the encoded document is written
    fn write(&self, reviews: &[Review], out: &mut dyn Write) -> OutputResult<()>;
}
