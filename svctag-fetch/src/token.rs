//! OAuth2 client-credentials token management.
//!
//! [`TokenManager`] owns the single live bearer token. Reads of a fresh token
//! take a short synchronous read lock. Refreshes are serialized by an async
//! mutex, and every caller re-checks the held token after acquiring it, so
//! any number of concurrent callers produce one token-endpoint request.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::client::{HttpClient, RequestSpec};
use crate::error::FetchError;

/// Subtracted from the server-reported lifetime.
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token response omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

// ============================================================================
// Credentials
// ============================================================================

/// OAuth2 client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns the client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Token
// ============================================================================

/// A bearer token with its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    bearer: String,
    expires_at: DateTime<Utc>,
}

impl Token {
    /// Creates a token.
    pub fn new(bearer: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            bearer: bearer.into(),
            expires_at,
        }
    }

    /// Returns the bearer string.
    pub fn secret(&self) -> &str {
        &self.bearer
    }

    /// Returns when the token stops being used.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true once `now` has reached the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the token is expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("bearer", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

// ============================================================================
// Token Manager
// ============================================================================

/// Holds the live token and refreshes it on demand.
pub struct TokenManager {
    http: HttpClient,
    token_url: String,
    credentials: Credentials,
    margin: Duration,
    current: RwLock<Option<Token>>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    /// Creates a manager with no token held.
    pub fn new(http: HttpClient, token_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            margin: DEFAULT_EXPIRY_MARGIN,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Sets the expiry safety margin.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Returns the token endpoint URL.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the held token if it is still fresh.
    pub fn current(&self) -> Option<Token> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().filter(|t| !t.is_expired()).cloned()
    }

    /// Returns a fresh token, fetching one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Auth`] if the token endpoint rejects the
    /// credentials, stays unreachable after retries, or omits
    /// `access_token`.
    pub async fn get_valid_token(&self) -> Result<Token, FetchError> {
        if let Some(token) = self.current() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(token) = self.current() {
            debug!("Token refreshed by a concurrent caller");
            return Ok(token);
        }
        self.refresh_locked().await
    }

    /// Replaces `stale` with a new token.
    ///
    /// If another caller already replaced `stale`, the newer token is
    /// returned without a network call.
    pub async fn force_refresh(&self, stale: &Token) -> Result<Token, FetchError> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.current() {
            if token != *stale {
                debug!("Stale token already replaced");
                return Ok(token);
            }
        }
        self.refresh_locked().await
    }

    /// Performs the grant. Callers must hold `refresh_lock`.
    #[instrument(skip(self), fields(token_url = %self.token_url, client_id = %self.credentials.client_id))]
    async fn refresh_locked(&self) -> Result<Token, FetchError> {
        let spec = RequestSpec::post_form(&self.token_url)
            .form_field("grant_type", "client_credentials")
            .form_field("client_id", &self.credentials.client_id)
            .form_field("client_secret", &self.credentials.client_secret);

        let issued_at = Utc::now();
        let response = self
            .http
            .execute(&spec)
            .await
            .map_err(|e| FetchError::Auth(format!("token request failed: {e}")))?;

        let body: TokenResponse = response
            .json()
            .map_err(|e| FetchError::Auth(format!("invalid token response: {e}")))?;

        let bearer = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FetchError::Auth("token response lacks access_token".to_string()))?;

        if let Some(kind) = body.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                warn!(token_type = kind, "Unexpected token type");
            }
        }

        let lifetime = body.expires_in.unwrap_or_else(|| {
            warn!(
                default_secs = DEFAULT_TOKEN_LIFETIME_SECS,
                "Token response lacks expires_in, assuming default lifetime"
            );
            DEFAULT_TOKEN_LIFETIME_SECS
        });
        let usable = lifetime.saturating_sub(self.margin.as_secs());
        let usable = i64::try_from(usable).unwrap_or(i64::MAX);
        let expires_at = ChronoDuration::try_seconds(usable)
            .and_then(|d| issued_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let token = Token::new(bearer, expires_at);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        info!(expires_at = %expires_at, "Obtained access token");
        Ok(token)
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url)
            .field("credentials", &self.credentials)
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}
