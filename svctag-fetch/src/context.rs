//! Fetch context bundling the transport and the token manager.
//!
//! Entitlement clients receive one [`FetchContext`] and use it for every
//! request, so all lookups share one connection pool and one live token.

use std::sync::Arc;
use std::time::Duration;

use crate::client::HttpClient;
use crate::error::FetchError;
use crate::retry::RetryStrategy;
use crate::tls::TlsPolicy;
use crate::token::{Credentials, TokenManager};

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Timeout for each attempt, including reading the body.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryStrategy,
    /// Certificate verification policy.
    pub tls: TlsPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: RetryStrategy::default(),
            tls: TlsPolicy::default(),
        }
    }
}

impl FetchSettings {
    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the TLS policy.
    pub fn with_tls(mut self, tls: TlsPolicy) -> Self {
        self.tls = tls;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Shared transport and token state.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// HTTP client.
    pub http: HttpClient,
    /// Token manager.
    pub tokens: Arc<TokenManager>,
    /// Settings the client was built from.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context from settings, a token URL, and credentials.
    pub fn new(
        settings: FetchSettings,
        token_url: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, FetchError> {
        Self::builder()
            .settings(settings)
            .token_url(token_url)
            .credentials(credentials)
            .build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    settings: FetchSettings,
    token_url: Option<String>,
    credentials: Option<Credentials>,
    expiry_margin: Option<Duration>,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fetch settings.
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryStrategy) -> Self {
        self.settings.retry = retry;
        self
    }

    /// Sets the TLS policy.
    pub fn tls(mut self, tls: TlsPolicy) -> Self {
        self.settings.tls = tls;
        self
    }

    /// Sets the OAuth2 token endpoint.
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Sets the client credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Overrides the token expiry safety margin.
    pub fn expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = Some(margin);
        self
    }

    /// Builds the fetch context.
    ///
    /// # Errors
    ///
    /// Fails if the token URL or credentials are missing, the token URL does
    /// not parse, or the HTTP client cannot be constructed.
    pub fn build(self) -> Result<FetchContext, FetchError> {
        let token_url = self
            .token_url
            .ok_or_else(|| FetchError::InvalidUrl("token URL not set".to_string()))?;
        url::Url::parse(&token_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{token_url}: {e}")))?;
        let credentials = self
            .credentials
            .ok_or_else(|| FetchError::Auth("client credentials not set".to_string()))?;

        let http = HttpClient::new(&self.settings)?;
        let mut tokens = TokenManager::new(http.clone(), token_url, credentials);
        if let Some(margin) = self.expiry_margin {
            tokens = tokens.with_margin(margin);
        }

        Ok(FetchContext {
            http,
            tokens: Arc::new(tokens),
            settings: self.settings,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
