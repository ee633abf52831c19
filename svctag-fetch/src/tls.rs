//! TLS verification policy.

use reqwest::{Certificate, ClientBuilder};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::FetchError;

/// How server certificates are verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Verify the peer against the system trust store, plus an optional
    /// PEM bundle of extra roots.
    Verify {
        /// Additional trusted roots.
        ca_bundle: Option<PathBuf>,
    },
    /// Accept any certificate. Every request made under this policy is
    /// logged at warn level.
    Insecure,
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self::Verify { ca_bundle: None }
    }
}

impl TlsPolicy {
    /// Returns true if peer verification is disabled.
    pub fn is_insecure(&self) -> bool {
        matches!(self, Self::Insecure)
    }

    /// Applies the policy to a client builder.
    pub fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder, FetchError> {
        match self {
            Self::Verify { ca_bundle: None } => Ok(builder),
            Self::Verify {
                ca_bundle: Some(path),
            } => {
                let pem = std::fs::read(path).map_err(|e| {
                    FetchError::ClientSetup(format!(
                        "cannot read CA bundle {}: {e}",
                        path.display()
                    ))
                })?;
                let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
                    FetchError::ClientSetup(format!(
                        "invalid CA bundle {}: {e}",
                        path.display()
                    ))
                })?;
                if certs.is_empty() {
                    return Err(FetchError::ClientSetup(format!(
                        "CA bundle {} contains no certificates",
                        path.display()
                    )));
                }
                debug!(path = %path.display(), count = certs.len(), "Loaded CA bundle");
                Ok(certs
                    .into_iter()
                    .fold(builder, ClientBuilder::add_root_certificate))
            }
            Self::Insecure => {
                warn!("TLS certificate verification is DISABLED for this client");
                Ok(builder.danger_accept_invalid_certs(true))
            }
        }
    }
}
