// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # svctag Store
//!
//! Process-lifetime state for svctag.
//!
//! This crate provides:
//!
//! - **ResponseCache**: TTL cache of parsed entitlement payloads
//! - **Config**: YAML configuration with `${VAR}` resolution and defaults
//!
//! ## Usage
//!
//! ```ignore
//! use svctag_store::{Config, ResponseCache, credentials_from_env, process_env};
//!
//! svctag_store::load_dotenv();
//! let config = Config::load(None)?;
//! let credentials = credentials_from_env(&process_env)?;
//! let cache = ResponseCache::new(config.cache_ttl);
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{DEFAULT_CACHE_TTL, ResponseCache};
pub use config::{
    CLIENT_ID_VAR, CLIENT_SECRET_VAR, Config, DEFAULT_BASE_URL, DEFAULT_TOKEN_URL, FileConfig,
    TlsMode, credentials_from_env, load_dotenv, process_env,
};
pub use error::StoreError;
