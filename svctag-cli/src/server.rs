//! REST facade over an [`EntitlementLookup`].
//!
//! | Method | Path                     | Body                          |
//! |--------|--------------------------|-------------------------------|
//! | GET    | `/api/health`            |                               |
//! | GET    | `/api/entitlement/{tag}` |                               |
//! | POST   | `/api/entitlement`       | `{"serviceTag": "..."}`       |
//! | POST   | `/api/batch`             | `{"serviceTags": ["...", ..]}`|
//!
//! Errors are returned as `{"error": kind, "message": ...}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use svctag_batch::BatchProcessor;
use svctag_core::{
    AssetEntitlements, EntitlementError, EntitlementLookup, FailureKind, TransportErrorKind,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::output::BatchOutput;

// ============================================================================
// State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    lookup: Arc<dyn EntitlementLookup>,
    processor: BatchProcessor,
}

impl AppState {
    /// Creates state whose batch endpoint runs `concurrency` lookups at once.
    pub fn new(lookup: Arc<dyn EntitlementLookup>, concurrency: usize) -> Self {
        let processor = BatchProcessor::new(Arc::clone(&lookup)).with_concurrency(concurrency);
        Self { lookup, processor }
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/entitlement", post(lookup_posted))
        .route("/api/entitlement/{tag}", get(lookup_path))
        .route("/api/batch", post(batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error with its HTTP mapping.
#[derive(Debug)]
pub enum ApiError {
    /// A lookup failed.
    Lookup(EntitlementError),
    /// The request body was missing or malformed.
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Lookup(e) => match e {
                EntitlementError::Validation(_) => StatusCode::BAD_REQUEST,
                EntitlementError::NotFound(_) => StatusCode::NOT_FOUND,
                EntitlementError::Transport {
                    kind: TransportErrorKind::Timeout,
                    ..
                } => StatusCode::GATEWAY_TIMEOUT,
                EntitlementError::Auth(_)
                | EntitlementError::Transport { .. }
                | EntitlementError::Parse(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl From<EntitlementError> for ApiError {
    fn from(err: EntitlementError) -> Self {
        Self::Lookup(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match &self {
            Self::Lookup(e) => (e.kind(), e.to_string()),
            Self::BadRequest(msg) => (FailureKind::Validation, msg.clone()),
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), kind = %kind, message = %message, "Request failed");
        }
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct LookupRequest {
    #[serde(rename = "serviceTag")]
    service_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    #[serde(rename = "serviceTags")]
    service_tags: Option<Vec<String>>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn lookup_path(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Arc<AssetEntitlements>>, ApiError> {
    Ok(Json(state.lookup.lookup(&tag).await?))
}

async fn lookup_posted(
    State(state): State<AppState>,
    body: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<Arc<AssetEntitlements>>, ApiError> {
    let Json(request) = body?;
    let tag = request
        .service_tag
        .ok_or_else(|| ApiError::BadRequest("missing field 'serviceTag'".to_string()))?;
    Ok(Json(state.lookup.lookup(&tag).await?))
}

async fn batch(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    let tags = request
        .service_tags
        .ok_or_else(|| ApiError::BadRequest("missing field 'serviceTags'".to_string()))?;

    let result = state.processor.process(tags).await;
    info!(
        processed = result.processed(),
        failed = result.failed(),
        "Served batch"
    );
    Ok(Json(BatchOutput::new(&result)).into_response())
}
