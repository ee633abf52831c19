//! Error taxonomy for entitlement lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Transport Error Kind
// ============================================================================

/// What went wrong on the wire once the retry budget was spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// An attempt exceeded the request timeout.
    Timeout,
    /// The connection could not be established or was dropped.
    Connection,
    /// The TLS handshake or certificate verification failed.
    Tls,
    /// The server answered with a non-success status.
    HttpStatus(u16),
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connection => write!(f, "connection"),
            Self::Tls => write!(f, "tls"),
            Self::HttpStatus(code) => write!(f, "http status {code}"),
        }
    }
}

// ============================================================================
// Entitlement Error
// ============================================================================

/// Error type for entitlement lookups.
#[derive(Debug, Clone, Error)]
pub enum EntitlementError {
    /// Bad input. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential or token failure.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network or protocol failure after retries were exhausted.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Failure class.
        kind: TransportErrorKind,
        /// Human-readable detail.
        message: String,
    },

    /// The remote API confirmed the service tag is unknown.
    #[error("Service tag not found: {0}")]
    NotFound(String),

    /// The response did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl EntitlementError {
    /// Creates a transport error.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Returns the coarse failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Auth(_) => FailureKind::Auth,
            Self::Transport { .. } => FailureKind::Transport,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Parse(_) => FailureKind::Parse,
        }
    }

    /// Returns the transport failure class, if this is a transport error.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

// ============================================================================
// Failure Kind
// ============================================================================

/// Coarse classification of a failed lookup, as recorded in batch results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input.
    Validation,
    /// Credentials rejected or token unavailable.
    Auth,
    /// Network failure.
    Transport,
    /// Unknown service tag.
    NotFound,
    /// Unexpected response shape.
    Parse,
}

impl FailureKind {
    /// Returns the stable lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Transport => "transport",
            Self::NotFound => "not_found",
            Self::Parse => "parse",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
