use std::sync::Arc;
use std::time::Duration;
use svctag_core::{EntitlementLookup, FailureKind, TransportErrorKind};
use svctag_fetch::{Credentials, FetchContext, FetchSettings, RetryStrategy};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::DellClient;

fn asset_json(tag: &str) -> serde_json::Value {
    serde_json::json!([{
        "id": 42,
        "serviceTag": tag,
        "productLineDescription": "PRECISION 7550",
        "shipDate": "2020-09-01T05:00:00Z",
        "countryCode": "GB",
        "invalid": false,
        "entitlements": [
            {
                "itemNumber": "709-16513",
                "startDate": "2020-09-01T05:00:00Z",
                "endDate": "2023-09-01T04:59:59.999Z",
                "entitlementType": "INITIAL",
                "serviceLevelCode": "KK",
                "serviceLevelDescription": "Keep Your Hard Drive",
                "serviceLevelGroup": 11
            }
        ]
    }])
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn client(server: &MockServer, attempts: u32) -> DellClient {
    let settings = FetchSettings::default()
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryStrategy::new(attempts).with_delay(Duration::from_millis(10)));
    let ctx = FetchContext::new(
        settings,
        format!("{}/auth/oauth/v2/token", server.uri()),
        Credentials::new("id", "secret"),
    )
    .unwrap();
    DellClient::new(ctx, format!("{}/PROD/sbil/eapi/v5/", server.uri()))
}

#[tokio::test]
async fn test_lookup_sends_bearer_and_tag() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/PROD/sbil/eapi/v5/asset-entitlements"))
        .and(query_param("servicetags", "XYZ7890"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_json("XYZ7890")))
        .expect(1)
        .mount(&server)
        .await;

    let dell = client(&server, 1);
    let data = dell.lookup(" xyz7890 ").await.unwrap();

    assert_eq!(data.asset.service_tag.as_str(), "XYZ7890");
    assert_eq!(data.asset.product_line_description, "PRECISION 7550");
    assert_eq!(data.entitlements.len(), 1);
}

#[tokio::test]
async fn test_cached_lookups_make_one_request() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/PROD/sbil/eapi/v5/asset-entitlements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_json("XYZ7890")))
        .expect(1)
        .mount(&server)
        .await;

    let dell = client(&server, 1);
    let first = dell.lookup_entitlement("XYZ7890").await.unwrap();
    let second = dell.lookup_entitlement("xyz7890").await.unwrap();
    let asset = dell.lookup_asset("XYZ7890").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(asset.country_code, "GB");
    assert_eq!(dell.cache().len(), 1);
}

#[tokio::test]
async fn test_repeated_lookups_share_payload() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/PROD/sbil/eapi/v5/asset-entitlements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_json("XYZ7890")))
        .mount(&server)
        .await;

    let dell = client(&server, 1);
    let first = dell.lookup("XYZ7890").await.unwrap();
    let second = dell.lookup("XYZ7890").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/PROD/sbil/eapi/v5/asset-entitlements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_json("XYZ7890")))
        .expect(2)
        .mount(&server)
        .await;

    let dell = client(&server, 1).with_cache_ttl(Duration::ZERO);
    dell.lookup("XYZ7890").await.unwrap();
    dell.lookup("XYZ7890").await.unwrap();
}

#[tokio::test]
async fn test_malformed_tag_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dell = client(&server, 3);
    for bad in ["ABC 123", "", "ABC-123", "ÄBC123"] {
        let err = dell.lookup(bad).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation, "{bad:?}");
    }
}

#[tokio::test]
async fn test_not_found_statuses() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(query_param("servicetags", "GONE404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("servicetags", "EMPTY01"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let dell = client(&server, 3);
    let err = dell.lookup("GONE404").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
    let err = dell.lookup("EMPTY01").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
    assert!(dell.cache().is_empty());
}

#[tokio::test]
async fn test_unexpected_shape_is_parse_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": "nope"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, 1).lookup("XYZ7890").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Parse);
}

#[tokio::test]
async fn test_server_error_exhausts_retries() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/PROD/sbil/eapi/v5/asset-entitlements"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 3).lookup("XYZ7890").await.unwrap_err();
    assert_eq!(
        err.transport_kind(),
        Some(TransportErrorKind::HttpStatus(503))
    );
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_json("XYZ7890")))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, 1).lookup("XYZ7890").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Auth);
}
