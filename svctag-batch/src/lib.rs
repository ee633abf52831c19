// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # svctag Batch
//!
//! Bulk lookups: read tags from CSV, look them up concurrently, write the
//! entitlements back out as CSV.
//!
//! - [`import::import_tags`] - Tag column detection, `Name` and inventory columns, skipped rows
//! - [`processor::BatchProcessor`] - Bounded, ordered, cancellable lookups
//! - [`export::CsvExporter`] - Entitlement rows, default or detailed layout
//!
//! ## Example
//!
//! ```ignore
//! use svctag_batch::{BatchProcessor, CsvExporter, ImportOptions, import_tags_from_path};
//!
//! let import = import_tags_from_path(path, &ImportOptions::default())?;
//! let result = BatchProcessor::new(lookup).process_import(&import).await;
//! std::fs::write("entitlements.csv", CsvExporter::new().to_csv(&result)?)?;
//! ```

pub mod error;
pub mod export;
pub mod import;
pub mod processor;

#[cfg(test)]
mod processor_tests;
#[cfg(test)]
mod test_support;

pub use error::{ExportError, ImportError};
pub use export::{CsvExporter, ExportLayout, write_failures_csv};
pub use import::{
    ImportEntry, ImportOptions, SkippedRow, TagImport, TagRecord, import_tags,
    import_tags_from_path,
};
pub use processor::{BatchProcessor, DEFAULT_CONCURRENCY};
