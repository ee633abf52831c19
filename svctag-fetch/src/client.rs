//! HTTP transport with retries and TLS policy.
//!
//! [`HttpClient::execute`] runs one logical request through the retry
//! policy. [`HttpClient::execute_authorized`] adds bearer authentication and
//! the 401 protocol: on a rejected token it forces exactly one refresh and
//! retries the request once.

use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::context::FetchSettings;
use crate::error::FetchError;
use crate::retry::RetryStrategy;
use crate::token::TokenManager;

/// User agent string for svctag.
const USER_AGENT: &str = concat!("svctag/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Request / Response
// ============================================================================

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET with query parameters.
    Get,
    /// POST with a URL-encoded form body.
    PostForm,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::PostForm => f.write_str("POST"),
        }
    }
}

/// Description of one logical request, replayable across attempts.
#[derive(Clone)]
pub struct RequestSpec {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    bearer: Option<String>,
}

impl RequestSpec {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a form POST request.
    pub fn post_form(url: impl Into<String>) -> Self {
        Self::new(Method::PostForm, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            form: Vec::new(),
            bearer: None,
        }
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds a form field.
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Sets the bearer token.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Returns the method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

// Form fields and the bearer token carry secrets.
impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("form_fields", &self.form.len())
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client with retry capabilities and a TLS policy.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    retry_strategy: RetryStrategy,
    insecure: bool,
}

impl HttpClient {
    /// Creates a client from settings.
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let builder = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT);
        let client = settings
            .tls
            .apply(builder)?
            .build()
            .map_err(|e| FetchError::ClientSetup(e.to_string()))?;

        Ok(Self {
            inner: client,
            retry_strategy: settings.retry.clone(),
            insecure: settings.tls.is_insecure(),
        })
    }

    /// Creates a client with default settings and a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        Self::new(&FetchSettings::default().with_timeout(timeout))
    }

    /// Sets the retry strategy for this client.
    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Returns the retry strategy.
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry_strategy
    }

    /// Executes a request, retrying transient failures.
    ///
    /// Returns the response for 2xx statuses. Everything else becomes a
    /// [`FetchError`] once the retry budget is spent, or immediately when
    /// the failure is not transient.
    #[instrument(skip(self, spec), fields(method = %spec.method, url = %spec.url))]
    pub async fn execute(&self, spec: &RequestSpec) -> Result<HttpResponse, FetchError> {
        let max_attempts = self.retry_strategy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Sending request");

            let error = match self.send_once(spec).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, "Response received");
                    return Ok(response);
                }
                Ok(response) => FetchError::from_status(response.status, &response.body),
                Err(e) => e,
            };

            if attempts < max_attempts && self.retry_strategy.should_retry(&error) {
                let delay = self.retry_strategy.delay_for_attempt(attempts);
                warn!(
                    error = %error,
                    attempt = attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if attempts > 1 {
                warn!(error = %error, attempts, "Request failed, giving up");
            }
            return Err(error);
        }
    }

    /// Executes a request with bearer authentication from `tokens`.
    ///
    /// A 401 forces one token refresh and one more try of the request. A
    /// second 401 is reported as [`FetchError::Auth`].
    #[instrument(skip(self, spec, tokens), fields(url = %spec.url))]
    pub async fn execute_authorized(
        &self,
        spec: &RequestSpec,
        tokens: &TokenManager,
    ) -> Result<HttpResponse, FetchError> {
        let token = tokens.get_valid_token().await?;

        match self.execute(&spec.clone().bearer(token.secret())).await {
            Err(FetchError::Unauthorized) => {
                warn!("Bearer token rejected, forcing refresh");
                let fresh = tokens.force_refresh(&token).await?;
                match self.execute(&spec.clone().bearer(fresh.secret())).await {
                    Err(FetchError::Unauthorized) => Err(FetchError::Auth(
                        "bearer token rejected after refresh".to_string(),
                    )),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Sends a single attempt and reads the whole body.
    async fn send_once(&self, spec: &RequestSpec) -> Result<HttpResponse, FetchError> {
        if self.insecure {
            warn!(url = %spec.url, "Sending request WITHOUT TLS certificate verification");
        }

        let mut request = match spec.method {
            Method::Get => self.inner.get(&spec.url),
            Method::PostForm => self.inner.post(&spec.url).form(&spec.form),
        };
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(token) = &spec.bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        Ok(HttpResponse { status, body })
    }
}
