//! Fetch error types.

use std::error::Error as StdError;
use std::io;
use svctag_core::{EntitlementError, TransportErrorKind};
use thiserror::Error;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for transport and token operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An attempt exceeded the request timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection failed or was dropped.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// TLS handshake or certificate verification failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server answered 401.
    #[error("Bearer token rejected (401)")]
    Unauthorized,

    /// The server answered with another non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Token acquisition failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A configured URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl FetchError {
    /// Classifies a non-success status code.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }
        Self::Status {
            status,
            body: truncate(body, MAX_ERROR_BODY),
        }
    }

    /// Classifies a reqwest error into timeout, TLS, or connection failure.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout(message)
        } else if is_tls_failure(err) {
            Self::Tls(describe_chain(err))
        } else {
            Self::Connection(describe_chain(err))
        }
    }

    /// Returns true for failures worth another attempt.
    ///
    /// Timeouts, connection failures, and 5xx responses are transient.
    /// TLS failures and 4xx responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<FetchError> for EntitlementError {
    fn from(err: FetchError) -> Self {
        let message = err.to_string();
        match err {
            FetchError::Timeout(_) => {
                EntitlementError::transport(TransportErrorKind::Timeout, message)
            }
            FetchError::Connection(_) | FetchError::InvalidUrl(_) => {
                EntitlementError::transport(TransportErrorKind::Connection, message)
            }
            FetchError::Tls(_) | FetchError::ClientSetup(_) => {
                EntitlementError::transport(TransportErrorKind::Tls, message)
            }
            FetchError::Status { status, .. } => {
                EntitlementError::transport(TransportErrorKind::HttpStatus(status), message)
            }
            FetchError::Unauthorized | FetchError::Auth(_) => EntitlementError::Auth(message),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Walks the source chain looking for certificate or handshake failures.
///
/// reqwest reports TLS problems as connect errors, so the only signal is the
/// underlying rustls message. The top-level message embeds the request URL
/// and is skipped. A socket-level I/O error ends the search.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<io::Error>() {
            if is_socket_failure(io.kind()) {
                return false;
            }
        }
        let msg = e.to_string().to_ascii_lowercase();
        if msg.contains("certificate")
            || msg.contains("tls")
            || msg.contains("handshake")
            || msg.contains("unknownissuer")
        {
            return true;
        }
        source = e.source();
    }
    false
}

fn is_socket_failure(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe
    )
}

fn describe_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
