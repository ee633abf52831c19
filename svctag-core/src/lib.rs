// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # svctag Core
//!
//! Core types, models, and traits shared by every svctag crate.
//!
//! ## Key Types
//!
//! ### Identifiers and Records
//! - [`ServiceTag`] - Validated, normalized service tag
//! - [`AssetRecord`] - Product, ship date, and country for an asset
//! - [`EntitlementRecord`] - One warranty/service-coverage line
//! - [`AssetEntitlements`] - An asset with its entitlements
//!
//! ### Batches
//! - [`BatchResult`] - Ordered per-input outcomes with derived counts
//! - [`TagOutcome`] / [`Outcome`] / [`TagFailure`]
//!
//! ### Errors
//! - [`EntitlementError`] - Validation, auth, transport, not-found, parse
//! - [`FailureKind`] - Coarse kind recorded per failed input

pub mod error;
pub mod models;
pub mod traits;

pub use error::{EntitlementError, FailureKind, TransportErrorKind};

pub use models::{
    // Records
    AssetDetails,
    AssetEntitlements,
    AssetRecord,
    EntitlementRecord,
    MAX_TAG_LEN,
    ServiceTag,
    // Batches
    BatchResult,
    BatchSummary,
    InventoryFields,
    Outcome,
    TagFailure,
    TagOutcome,
    // Files
    CsvEncoding,
    UTF8_BOM,
};

pub use traits::EntitlementLookup;
