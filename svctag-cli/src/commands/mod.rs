//! CLI command implementations.

pub mod check;
pub mod config;
pub mod process;
pub mod serve;

use anyhow::{Context, Result};
use svctag_providers::DellClient;
use svctag_store::{Config, credentials_from_env, process_env};

use crate::Cli;

/// Loads the configuration selected by `--config`.
pub(crate) fn load_config(cli: &Cli) -> Result<Config> {
    Config::load(cli.config.as_deref()).context("Failed to load configuration")
}

/// Builds the entitlement client from config and environment credentials.
pub(crate) fn build_client(config: &Config) -> Result<DellClient> {
    let credentials = credentials_from_env(&process_env)?;
    DellClient::from_config(config, credentials).context("Failed to set up API client")
}
