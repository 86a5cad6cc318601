//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: login → authenticated request → 401 →
//! token refresh → single resubmission.

use jwt_refresh_client::http::HttpClientConfig;
use jwt_refresh_client::store::MemoryPersistence;
use jwt_refresh_client::{ClientOptions, Error, JwtClient, LoginResponse};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn url(server: &MockServer, path: &str) -> String {
    format!("{}{}", server.uri(), path)
}

fn client_for(server: &MockServer) -> JwtClient {
    JwtClient::builder()
        .persistence(Arc::new(MemoryPersistence::new()))
        .login_descriptor(url(server, "/login-url"), "username", "password")
        .unwrap()
        .refresh_token_retrieval_url(url(server, "/retrieval-url"))
        .build()
        .unwrap()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login-url"))
        .and(body_json(json!({"username": "marian", "password": "nowak"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "maintoken",
            "refresh_token": "refreshtoken"
        })))
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/retrieval-url"))
        .and(body_json(json!({
            "token": "maintoken",
            "refresh_token": "refreshtoken"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "new-maintoken",
            "refresh_token": "new-refreshtoken"
        })))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Requests without tokens
// ============================================================================

#[tokio::test]
async fn test_public_request_without_auth_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public-url"))
        .respond_with(ResponseTemplate::new(200).set_body_string("some text"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.get(&url(&server, "/public-url")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data, json!("some text"));
    assert!(response.request.header_value("Authorization").is_none());
}

#[tokio::test]
async fn test_private_request_without_tokens_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .respond_with(ResponseTemplate::new(401).set_body_string("some text"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get(&url(&server, "/private-url")).await.unwrap_err();

    let response = err.response().unwrap();
    assert_eq!(response.status, 401);
    assert_eq!(response.data, json!("some text"));
    assert!(response.request.header_value("Authorization").is_none());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let client = client_for(&server);

    assert!(client.login("marian", "nowak").await.unwrap());
    assert_eq!(client.handler().get_token().as_deref(), Some("maintoken"));
    assert_eq!(
        client.handler().get_refresh_token().as_deref(),
        Some("refreshtoken")
    );
}

#[tokio::test]
async fn test_login_with_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login-url"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.login("marian", "nowak").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(client.handler().get_token(), None);
}

#[tokio::test]
async fn test_login_with_callable() {
    let client = JwtClient::builder()
        .use_local_storage(false)
        .login_callable(|username: String, _password: String| async move {
            Ok::<_, Error>(LoginResponse::new(json!({
                "token": format!("t-{username}"),
                "refreshToken": "r1"
            })))
        })
        .build()
        .unwrap();

    assert!(client.login("u", "p").await.unwrap());
    assert_eq!(client.handler().get_token().as_deref(), Some("t-u"));
    assert_eq!(client.handler().get_refresh_token().as_deref(), Some("r1"));
}

// ============================================================================
// Authenticated requests
// ============================================================================

#[tokio::test]
async fn test_login_then_request_sends_bearer() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .and(header("Authorization", "Bearer maintoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "somedata"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("marian", "nowak").await.unwrap();

    let response = client.get(&url(&server, "/private-url")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data["data"], "somedata");
    assert_eq!(
        response.request.header_value("Authorization"),
        Some("Bearer maintoken")
    );
}

#[tokio::test]
async fn test_login_then_401_refreshes_and_retries() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_refresh(&server).await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .and(header("Authorization", "Bearer maintoken"))
        .respond_with(ResponseTemplate::new(401).set_body_string("not signed"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .and(header("Authorization", "Bearer new-maintoken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("signed"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("marian", "nowak").await.unwrap();

    let response = client.get(&url(&server, "/private-url")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data, json!("signed"));
    assert!(response.request.second_attempt);
    assert_eq!(
        response.request.header_value("Authorization"),
        Some("Bearer new-maintoken")
    );
    assert_eq!(
        client.handler().get_refresh_token().as_deref(),
        Some("new-refreshtoken")
    );
}

#[tokio::test]
async fn test_retried_401_is_not_refreshed_again() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_refresh(&server).await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .respond_with(ResponseTemplate::new(401).set_body_string("not signed"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("marian", "nowak").await.unwrap();

    let err = client.get(&url(&server, "/private-url")).await.unwrap_err();

    assert!(err.is_unauthorized());
    let request = &err.response().unwrap().request;
    assert!(request.second_attempt);
    assert_eq!(request.header_value("Authorization"), Some("Bearer new-maintoken"));
}

#[tokio::test]
async fn test_refresh_failure_runs_logout_and_clears_tokens() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/retrieval-url"))
        .respond_with(ResponseTemplate::new(401).set_body_string("refresh expired"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let logouts = Arc::new(AtomicUsize::new(0));
    let counter = logouts.clone();
    let client = JwtClient::builder()
        .persistence(Arc::new(MemoryPersistence::new()))
        .login_descriptor(url(&server, "/login-url"), "username", "password")
        .unwrap()
        .refresh_token_retrieval_url(url(&server, "/retrieval-url"))
        .logout_action(move |err| {
            assert!(err.is_unauthorized());
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    client.login("marian", "nowak").await.unwrap();

    let err = client.get(&url(&server, "/private-url")).await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired { .. }));
    assert_eq!(logouts.load(Ordering::SeqCst), 1);
    assert_eq!(client.handler().get_token(), None);
    assert_eq!(client.handler().get_refresh_token(), None);
}

#[tokio::test]
async fn test_refresh_failure_without_logout_surfaces_401() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/retrieval-url"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private-url"))
        .respond_with(ResponseTemplate::new(401).set_body_string("not signed"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("marian", "nowak").await.unwrap();

    let err = client.get(&url(&server, "/private-url")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.response().unwrap().data, json!("not signed"));
    assert_eq!(client.handler().get_token().as_deref(), Some("maintoken"));
}

// ============================================================================
// Options
// ============================================================================

#[tokio::test]
async fn test_relative_urls_with_base_url() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_refresh(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/items/1"))
        .and(header("Authorization", "Bearer maintoken"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/items/1"))
        .and(header("Authorization", "Bearer new-maintoken"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = format!(
        r#"
refresh_token_retrieval_url: /retrieval-url
login:
  url: /login-url
  username_field: username
  password_field: password
http:
  base_url: {}
"#,
        server.uri()
    );
    let options = ClientOptions::from_yaml_str(&yaml).unwrap();
    let client = JwtClient::builder()
        .options(options)
        .persistence(Arc::new(MemoryPersistence::new()))
        .build()
        .unwrap();

    client.login("marian", "nowak").await.unwrap();
    let response = client.delete("/items/1").await.unwrap();

    assert_eq!(response.status, 204);
    assert_eq!(response.data, serde_json::Value::Null);
}

#[tokio::test]
async fn test_default_headers_are_sent_with_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .and(header("X-App", "demo"))
        .and(header("Authorization", "Bearer manual"))
        .and(body_json(json!({"name": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = JwtClient::builder()
        .use_local_storage(false)
        .http_config(
            HttpClientConfig::builder()
                .base_url(server.uri())
                .header("X-App", "demo")
                .build(),
        )
        .build()
        .unwrap();
    client.handler().set_token("manual").unwrap();

    let response = client.put("/items/1", json!({"name": "x"})).await.unwrap();

    #[derive(serde::Deserialize)]
    struct Ack {
        ok: bool,
    }
    assert!(response.json::<Ack>().unwrap().ok);
}
