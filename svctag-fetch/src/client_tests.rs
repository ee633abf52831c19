//! Transport tests: retries, error classification, and the 401 protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{HttpClient, HttpResponse, RequestSpec};
use crate::context::FetchSettings;
use crate::error::FetchError;
use crate::retry::RetryStrategy;
use crate::token::{Credentials, TokenManager};

fn fast_client(attempts: u32) -> HttpClient {
    let settings = FetchSettings::default()
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryStrategy::new(attempts).with_delay(Duration::from_millis(10)));
    HttpClient::new(&settings).unwrap()
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

#[test]
fn test_request_spec_debug_redacts_secrets() {
    let spec = RequestSpec::post_form("https://auth.example.com/token")
        .form_field("client_secret", "hunter2")
        .bearer("abc.def.ghi");
    let debug = format!("{spec:?}");
    assert!(!debug.contains("hunter2"));
    assert!(!debug.contains("abc.def.ghi"));
    assert!(debug.contains("auth.example.com"));
}

#[test]
fn test_response_success_range() {
    let ok = HttpResponse {
        status: 204,
        body: String::new(),
    };
    let missing = HttpResponse {
        status: 404,
        body: String::new(),
    };
    assert!(ok.is_success());
    assert!(!missing.is_success());
}

#[tokio::test]
async fn test_get_sends_query_and_accept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("servicetags", "ABC1234"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(1);
    let spec = RequestSpec::get(format!("{}/lookup", server.uri())).query("servicetags", "ABC1234");
    let response = client.execute(&spec).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "[]");
}

#[tokio::test]
async fn test_retries_exactly_max_attempts_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let client = fast_client(3);
    let err = client
        .execute(&RequestSpec::get(format!("{}/flaky", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_no_retry_on_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(3);
    let err = client
        .execute(&RequestSpec::get(format!("{}/missing", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recover"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recover"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(3);
    let response = client
        .execute(&RequestSpec::get(format!("{}/recover", server.uri())))
        .await
        .unwrap();
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_attempt_timeout_is_transport_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let settings = FetchSettings::default()
        .with_timeout(Duration::from_millis(100))
        .with_retry(RetryStrategy::new(2).with_delay(Duration::from_millis(10)));
    let client = HttpClient::new(&settings).unwrap();

    let err = client
        .execute(&RequestSpec::get(format!("{}/slow", server.uri())))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)));
}

#[tokio::test]
async fn test_connection_refused_is_connection_error() {
    // Bind and drop a listener to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = fast_client(2);
    let err = client
        .execute(&RequestSpec::get(format!("http://127.0.0.1:{port}/")))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Connection(_)));
}

#[tokio::test]
async fn test_refused_connection_with_tls_in_url_is_retried() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = fast_client(3);
    let err = client
        .execute(&RequestSpec::get(format!(
            "http://127.0.0.1:{port}/tls/asset-entitlements"
        )))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Connection(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_retries_exactly_max_attempts_on_dropped_connection() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    let acceptor = tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    let client = fast_client(3);
    let err = client
        .execute(&RequestSpec::get(format!("http://{addr}/asset-entitlements")))
        .await
        .unwrap_err();
    acceptor.abort();

    assert!(matches!(err, FetchError::Connection(_)), "got {err:?}");
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_authorized_refreshes_once_on_401() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "first",
            "expires_in": 3600
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_token(&server, "second").await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("authorization", "Bearer first"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("authorization", "Bearer second"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(1);
    let tokens = TokenManager::new(
        client.clone(),
        format!("{}/token", server.uri()),
        Credentials::new("id", "secret"),
    );

    let response = client
        .execute_authorized(&RequestSpec::get(format!("{}/data", server.uri())), &tokens)
        .await
        .unwrap();
    assert_eq!(response.body, "[]");
    assert_eq!(tokens.current().unwrap().secret(), "second");
}

#[tokio::test]
async fn test_authorized_second_401_is_auth_error() {
    let server = MockServer::start().await;
    mount_token(&server, "always-rejected").await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = fast_client(3);
    let tokens = TokenManager::new(
        client.clone(),
        format!("{}/token", server.uri()),
        Credentials::new("id", "secret"),
    );

    let err = client
        .execute_authorized(&RequestSpec::get(format!("{}/data", server.uri())), &tokens)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Auth(_)));
}
