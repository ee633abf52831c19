//! Dell warranty/entitlement provider.
//!
//! Looks up assets through the Dell asset-entitlements v5 API, which is
//! protected by an OAuth2 client-credentials grant.
//!
//! ## Credentials
//!
//! Read from the environment:
//! - `DELL_API_CLIENT_ID`
//! - `DELL_API_CLIENT_SECRET`
//!
//! ## Usage
//!
//! ```ignore
//! use svctag_core::EntitlementLookup;
//! use svctag_providers::dell::DellClient;
//!
//! let client = DellClient::from_config(&config, credentials)?;
//! let entitlements = client.lookup_entitlement("ABC1234").await?;
//! ```

mod api;
mod parser;

#[cfg(test)]
mod api_tests;

pub use api::{DellClient, ENTITLEMENTS_ENDPOINT};
pub use parser::parse_entitlements_response;
