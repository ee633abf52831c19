//! Batch error types.

use std::path::PathBuf;
use thiserror::Error;

/// Whole-file import failures. Per-row problems are reported as
/// [`crate::import::SkippedRow`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The input has no header row.
    #[error("Input is empty")]
    Empty,

    /// The header row could not be parsed.
    #[error("Invalid header row: {0}")]
    Header(#[from] csv::Error),

    /// The requested column is not in the header.
    #[error("Column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        /// Requested column name.
        column: String,
        /// Columns present in the header.
        available: Vec<String>,
    },
}

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
