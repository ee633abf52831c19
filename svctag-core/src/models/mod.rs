//! Domain models for svctag.
//!
//! ## Submodules
//!
//! - [`tag`] - Validated service tag identifier
//! - [`asset`] - Asset and entitlement records
//! - [`batch`] - Per-input outcomes and batch results
//! - [`encoding`] - CSV output encoding

mod asset;
mod batch;
mod encoding;
mod tag;

pub use asset::{AssetDetails, AssetEntitlements, AssetRecord, EntitlementRecord};
pub use batch::{BatchResult, BatchSummary, InventoryFields, Outcome, TagFailure, TagOutcome};
pub use encoding::{CsvEncoding, UTF8_BOM};
pub use tag::{MAX_TAG_LEN, ServiceTag};
#[cfg(test)]
mod serde_tests;
