// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # svctag Fetch
//!
//! HTTP transport and OAuth2 token management for svctag.
//!
//! ## Transport
//!
//! - [`client::HttpClient`] - Executes requests under a retry policy and a
//!   TLS policy, with optional bearer authentication
//! - [`retry::RetryStrategy`] - Bounded attempts with fixed or linear delay
//! - [`tls::TlsPolicy`] - Verify peers (optionally with a CA bundle) or
//!   explicitly opt out
//!
//! ## Tokens
//!
//! - [`token::TokenManager`] - Holds the single live token; at most one
//!   refresh in flight
//!
//! ## Example
//!
//! ```ignore
//! use svctag_fetch::{Credentials, FetchContext, FetchSettings, RequestSpec};
//!
//! let ctx = FetchContext::new(
//!     FetchSettings::default(),
//!     "https://auth.example.com/oauth/token",
//!     Credentials::new("client-id", "client-secret"),
//! )?;
//!
//! let spec = RequestSpec::get("https://api.example.com/assets").query("id", "ABC1234");
//! let response = ctx.http.execute_authorized(&spec, &ctx.tokens).await?;
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod retry;
pub mod tls;
pub mod token;

pub use client::{HttpClient, HttpResponse, Method, RequestSpec};
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use error::FetchError;
pub use retry::{Backoff, RetryStrategy};
pub use tls::TlsPolicy;
pub use token::{Credentials, Token, TokenManager};

#[cfg(test)]
mod client_tests;
