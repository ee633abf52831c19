// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # svctag Providers
//!
//! Vendor entitlement clients for svctag.
//!
//! Each provider module implements [`svctag_core::EntitlementLookup`] on top
//! of the shared transport in `svctag-fetch` and the response cache in
//! `svctag-store`. It includes:
//!
//! - **Client**: Tag validation, caching, and the authorized request
//! - **Parser**: Strict parsing of the vendor response into core records
//!
//! ## Supported Providers
//!
//! | Provider | Auth | API |
//! |----------|------|-----|
//! | Dell | OAuth2 client credentials | asset-entitlements v5 |

pub mod dell;

pub use dell::DellClient;
