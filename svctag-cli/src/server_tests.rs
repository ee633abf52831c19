use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use svctag_core::{
    AssetDetails, AssetEntitlements, AssetRecord, EntitlementError, EntitlementLookup, EntitlementRecord,
    ServiceTag, TransportErrorKind,
};
use tower::ServiceExt;

use crate::server::{AppState, router};

/// Answers by tag: `MISSING` is unknown, `SLOW` times out, `DENIED` fails
/// auth, `GARBLED` fails to parse, anything else valid succeeds.
struct StubLookup;

#[async_trait]
impl EntitlementLookup for StubLookup {
    async fn lookup(&self, raw: &str) -> Result<Arc<AssetEntitlements>, EntitlementError> {
        let tag = ServiceTag::parse(raw)?;
        match tag.as_str() {
            "MISSING" => Err(EntitlementError::NotFound(tag.to_string())),
            "SLOW" => Err(EntitlementError::transport(
                TransportErrorKind::Timeout,
                "timed out",
            )),
            "REFUSED" => Err(EntitlementError::transport(
                TransportErrorKind::Connection,
                "connection refused",
            )),
            "DENIED" => Err(EntitlementError::Auth("invalid_client".into())),
            "GARBLED" => Err(EntitlementError::Parse("not an array".into())),
            _ => {
                let date = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
                Ok(Arc::new(AssetEntitlements {
                    asset: AssetRecord {
                        service_tag: tag,
                        product_line_description: "LATITUDE 5440".into(),
                        ship_date: date,
                        country_code: "US".into(),
                        details: AssetDetails::default(),
                    },
                    entitlements: vec![EntitlementRecord {
                        item_number: "709-1234".into(),
                        start_date: date,
                        end_date: date,
                        entitlement_type: "INITIAL".into(),
                        service_level_code: "PJ".into(),
                        service_level_description: "ProSupport".into(),
                        service_level_group: 5,
                    }],
                }))
            }
        }
    }
}

fn app() -> Router {
    router(AppState::new(Arc::new(StubLookup), 2))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(uri: &str, body: &str) -> (StatusCode, Value) {
    send(
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_get_entitlement() {
    let (status, body) = get_json("/api/entitlement/abc1234").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset"]["serviceTag"], "ABC1234");
    assert_eq!(body["entitlements"][0]["serviceLevelCode"], "PJ");
}

#[tokio::test]
async fn test_post_entitlement() {
    let (status, body) = post_json("/api/entitlement", r#"{"serviceTag": "ABC1234"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset"]["countryCode"], "US");
}

#[tokio::test]
async fn test_post_entitlement_missing_tag() {
    let (status, body) = post_json("/api/entitlement", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_post_entitlement_malformed_body() {
    let (status, body) = post_json("/api/entitlement", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_error_status_mapping() {
    let cases = [
        ("/api/entitlement/bad%20tag", StatusCode::BAD_REQUEST, "validation"),
        ("/api/entitlement/MISSING", StatusCode::NOT_FOUND, "not_found"),
        ("/api/entitlement/SLOW", StatusCode::GATEWAY_TIMEOUT, "transport"),
        ("/api/entitlement/REFUSED", StatusCode::BAD_GATEWAY, "transport"),
        ("/api/entitlement/DENIED", StatusCode::BAD_GATEWAY, "auth"),
        ("/api/entitlement/GARBLED", StatusCode::BAD_GATEWAY, "parse"),
    ];
    for (uri, expected, kind) in cases {
        let (status, body) = get_json(uri).await;
        assert_eq!(status, expected, "{uri}");
        assert_eq!(body["error"], kind, "{uri}");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_batch() {
    let (status, body) = post_json(
        "/api/batch",
        r#"{"serviceTags": ["AAA1111", "MISSING", "BBB2222"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], 3);
    assert_eq!(body["successful"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["cancelled"], false);

    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes[0]["input"], "AAA1111");
    assert_eq!(outcomes[1]["outcome"]["status"], "failure");
    assert_eq!(outcomes[1]["outcome"]["kind"], "not_found");
    assert_eq!(outcomes[2]["input"], "BBB2222");
}

#[tokio::test]
async fn test_batch_missing_tags() {
    let (status, _) = post_json("/api/batch", r#"{"tags": []}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
