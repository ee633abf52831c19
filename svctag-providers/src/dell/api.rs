//! Dell entitlement API client.
//!
//! # API Endpoint
//!
//! ```text
//! GET {base_url}/asset-entitlements?servicetags=<TAG>
//! Authorization: Bearer <access_token>
//! ```
//!
//! Tokens come from the OAuth2 client-credentials grant at the configured
//! token URL. Parsed payloads are cached per tag for the cache TTL.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use svctag_core::{AssetEntitlements, EntitlementError, EntitlementLookup, ServiceTag};
use svctag_fetch::{Credentials, FetchContext, FetchError, RequestSpec};
use svctag_store::{Config, ResponseCache};
use tracing::{debug, info, instrument};

use super::parser::parse_entitlements_response;

// ============================================================================
// Constants
// ============================================================================

/// Entitlements endpoint, relative to the base URL.
pub const ENTITLEMENTS_ENDPOINT: &str = "/asset-entitlements";

/// Query parameter carrying the tag.
const TAGS_PARAM: &str = "servicetags";

// ============================================================================
// Dell Client
// ============================================================================

/// Entitlement client for the Dell asset-entitlements API.
#[derive(Debug)]
pub struct DellClient {
    ctx: FetchContext,
    base_url: String,
    cache: ResponseCache<Arc<AssetEntitlements>>,
}

impl DellClient {
    /// Creates a client with the default cache TTL.
    pub fn new(ctx: FetchContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: ResponseCache::default(),
        }
    }

    /// Creates a client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Fails if the transport cannot be built (bad token URL, unreadable CA
    /// bundle).
    pub fn from_config(config: &Config, credentials: Credentials) -> Result<Self, FetchError> {
        let ctx = FetchContext::new(config.fetch_settings(), &config.token_url, credentials)?;
        Ok(Self::new(ctx, &config.base_url).with_cache_ttl(config.cache_ttl))
    }

    /// Replaces the cache with one using `ttl`. Zero disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::new(ttl);
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the response cache.
    pub fn cache(&self) -> &ResponseCache<Arc<AssetEntitlements>> {
        &self.cache
    }

    /// Returns the fetch context.
    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Fetches and parses the payload for a validated tag, bypassing the
    /// cache.
    #[instrument(skip_all, fields(tag = %tag))]
    async fn fetch(&self, tag: &ServiceTag) -> Result<AssetEntitlements, EntitlementError> {
        let url = format!("{}{}", self.base_url, ENTITLEMENTS_ENDPOINT);
        let spec = RequestSpec::get(url).query(TAGS_PARAM, tag.as_str());

        let response = match self
            .ctx
            .http
            .execute_authorized(&spec, &self.ctx.tokens)
            .await
        {
            Ok(response) => response,
            Err(FetchError::Status { status: 404, .. }) => {
                return Err(EntitlementError::NotFound(tag.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(len = response.body.len(), "Received entitlement response");
        parse_entitlements_response(&response.body, tag)
    }
}

#[async_trait]
impl EntitlementLookup for DellClient {
    async fn lookup(&self, raw: &str) -> Result<Arc<AssetEntitlements>, EntitlementError> {
        let tag = ServiceTag::parse(raw)?;

        if let Some(cached) = self.cache.get(&tag) {
            debug!(tag = %tag, "Serving entitlements from cache");
            return Ok(cached);
        }

        let data = Arc::new(self.fetch(&tag).await?);
        info!(
            tag = %tag,
            entitlements = data.entitlements.len(),
            "Fetched entitlements"
        );
        self.cache.put(tag, Arc::clone(&data));
        Ok(data)
    }
}
