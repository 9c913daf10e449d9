//! Output module for persisting harvested reviews
//!
//! This module handles:
//! - Encoding reviews as structured JSON or flattened CSV
//! - Choosing the output file name for a format
//! - Printing the statistics of a finished crawl

mod csv_output;
mod json_output;
pub mod stats;
mod traits;

pub use csv_output::{CsvSink, CSV_COLUMNS};
pub use json_output::{JsonSink, DOCUMENT_VERSION};
pub use stats::{format_statistics, print_statistics};
pub use traits::{OutputError, OutputFormat, OutputResult, ResultSink};

use crate::model::Review;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Returns the sink that writes `format`
pub fn sink_for(format: OutputFormat) -> Box<dyn ResultSink> {
    match format {
        OutputFormat::Json => Box::new(JsonSink),
        OutputFormat::Csv => Box::new(CsvSink),
    }
}

/// Returns `path` with its extension replaced by the one `format` is written with
///
/// # Examples
///
/// ```
/// use review_harvest::output::{output_path_for, OutputFormat};
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     output_path_for(Path::new("out/reviews.json"), OutputFormat::Csv),
///     PathBuf::from("out/reviews.csv")
/// );
/// ```
pub fn output_path_for(path: &Path, format: OutputFormat) -> PathBuf {
    path.with_extension(format.extension())
}

/// Writes `reviews` to `path` in `format`
///
/// # Arguments
///
/// * `reviews` - The retained reviews of the run
/// * `path` - The requested output path; its extension is coerced to the format
/// * `format` - The output encoding
///
/// # Returns
///
/// * `Ok(PathBuf)` - The path actually written
/// * `Err(OutputError)` - The file could not be created or encoded
pub fn save_reviews(reviews: &[Review], path: &Path, format: OutputFormat) -> OutputResult<PathBuf> {
    let path = output_path_for(path, format);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(&path)?);
    sink_for(format).write(reviews, &mut writer)?;
    writer.flush()?;

    tracing::info!("Saved {} reviews to {}", reviews.len(), path.display());
    Ok(path)
}
