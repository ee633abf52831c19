//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML document could not be parsed or did not match the schema.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A `${VAR}` placeholder names an unset variable and has no default.
    #[error("Environment variable '{0}' is not set and has no default")]
    UndefinedVariable(String),

    /// A value is out of range or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required credential variable is missing.
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}
