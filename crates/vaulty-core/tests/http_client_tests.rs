//! HTTP vault client against a mock server

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use vaulty_core::{HttpVaultClient, SecretRequest, VaultClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpVaultClient {
    HttpVaultClient::new(Duration::from_secs(5)).unwrap()
}

fn request(server: &MockServer, namespace: Option<&str>) -> SecretRequest {
    SecretRequest {
        address: server.uri(),
        namespace: namespace.map(String::from),
        path: "app/config".into(),
        token: "s.token".into(),
    }
}

#[tokio::test]
async fn reads_secret_with_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/data/app/config"))
        .and(header("X-Vault-Token", "s.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": {"user": "admin"},
                "metadata": {"created_time": "2024-01-01T00:00:00Z", "destroyed": false, "version": 3}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secret = client()
        .read_secret(&request(&server, Some("kv")))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(secret.data.unwrap()["user"], "admin");
    assert_eq!(secret.metadata.version, Some(3));
    assert!(!secret.metadata.destroyed);
}

#[tokio::test]
async fn error_array_becomes_vault_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/data/app/config"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
        )
        .mount(&server)
        .await;

    let err = client()
        .read_secret(&request(&server, None))
        .await
        .unwrap_err();

    assert_eq!(err.errors, vec!["permission denied".to_string()]);
    assert_eq!(err.url, format!("{}/v1/data/app/config", server.uri()));
    assert_eq!(err.to_string(), "Vault returned errors\n- permission denied");
}

#[tokio::test]
async fn status_without_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client()
        .read_secret(&request(&server, None))
        .await
        .unwrap_err();
    assert_eq!(err.errors, vec!["Request failed with status code 503".to_string()]);
}

#[tokio::test]
async fn lookup_merges_lease_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .and(header("X-Vault-Token", "s.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_id": "auth/token/create/abc",
            "data": {
                "accessor": "acc",
                "expire_time": "2099-01-01T00:00:00Z",
                "renewable": true,
                "ttl": 3600,
                "type": "service",
                "policies": ["default"]
            }
        })))
        .mount(&server)
        .await;

    let lookup = client()
        .lookup_token(&server.uri(), "s.token")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(lookup.lease_id, "auth/token/create/abc");
    assert_eq!(lookup.token_type, "service");
    assert!(lookup.is_renewable());
}

#[tokio::test]
async fn renew_posts_to_renew_self() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .and(header("X-Vault-Token", "s.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-1",
            "lease_duration": 0,
            "renewable": false,
            "auth": {"client_token": "s.token", "lease_duration": 3600, "renewable": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let renewal = client()
        .renew_token(&server.uri(), "s.token")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(renewal.request_id, "req-1");
    assert_eq!(renewal.auth.unwrap()["lease_duration"], 3600);
}

#[tokio::test]
async fn unreachable_server_is_a_vault_error() {
    let err = client()
        .lookup_token("http://127.0.0.1:1", "s.token")
        .await
        .unwrap_err();
    assert_eq!(err.url, "http://127.0.0.1:1/v1/auth/token/lookup-self");
    assert_eq!(err.errors.len(), 1);
}
