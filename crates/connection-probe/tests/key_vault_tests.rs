//! Integration tests for Key Vault secret resolution.
//!
//! A wiremock stand-in for the vault data plane verifies the REST
//! contract (path shape, api-version, bearer auth) and the absent versus
//! failed distinction made by `resolve_secret`.

use std::collections::HashMap;

use connection_probe::secrets::{resolve_secret, KeyVaultClient, SecretError, SecretStore};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a vault secret under the data-plane contract the client speaks.
async fn mount_secret(server: &MockServer, name: &str, value: &str, token: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/secrets/{name}")))
        .and(query_param("api-version", "7.4"))
        .and(header("Authorization", format!("Bearer {token}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": value,
            "id": format!("{}/secrets/{name}/0123456789abcdef", server.uri()),
            "attributes": { "enabled": true }
        })))
        .mount(server)
        .await;
}

fn refs(key: &str, template: &str) -> HashMap<String, String> {
    HashMap::from([(key.to_string(), template.to_string())])
}

#[tokio::test]
async fn test_fetch_follows_the_data_plane_contract() {
    let server = MockServer::start().await;
    mount_secret(&server, "db-password", "hunter2", "unit-token").await;

    let client = KeyVaultClient::with_token(server.uri(), "unit-token").unwrap();
    let value = client.fetch("db-password").await.unwrap();

    assert_eq!(value, "hunter2");
}

#[tokio::test]
async fn test_trailing_slash_in_vault_uri_is_tolerated() {
    let server = MockServer::start().await;
    mount_secret(&server, "db-password", "hunter2", "unit-token").await;

    let client = KeyVaultClient::with_token(format!("{}/", server.uri()), "unit-token").unwrap();
    let value = client.fetch("db-password").await.unwrap();

    assert_eq!(value, "hunter2");
}

#[tokio::test]
async fn test_missing_secret_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secrets/absent"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "SecretNotFound", "message": "absent not found" }
        })))
        .mount(&server)
        .await;

    let client = KeyVaultClient::with_token(server.uri(), "unit-token").unwrap();
    let err = client.fetch("absent").await.unwrap_err();

    assert!(matches!(err, SecretError::Api { status: 404, .. }));
    assert!(err.to_string().contains("'absent'"));
}

#[tokio::test]
async fn test_resolve_secret_substitutes_env_before_fetching() {
    let server = MockServer::start().await;
    mount_secret(&server, "svc-token-prod", "prod-token", "unit-token").await;

    let client = KeyVaultClient::with_token(server.uri(), "unit-token").unwrap();
    let secret_refs = refs("api_token", "svc-token-<env>");

    let value = resolve_secret(Some(&client), &secret_refs, "api_token", "prod")
        .await
        .unwrap();

    assert_eq!(value.as_deref(), Some("prod-token"));
}

#[tokio::test]
async fn test_empty_vault_value_counts_as_absent() {
    let server = MockServer::start().await;
    mount_secret(&server, "svc-token-dev", "", "unit-token").await;

    let client = KeyVaultClient::with_token(server.uri(), "unit-token").unwrap();
    let secret_refs = refs("api_token", "svc-token-<env>");

    let value = resolve_secret(Some(&client), &secret_refs, "api_token", "dev")
        .await
        .unwrap();

    assert!(value.is_none());
}

#[tokio::test]
async fn test_vault_server_errors_surface_as_errors_not_absence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = KeyVaultClient::with_token(server.uri(), "unit-token").unwrap();
    let secret_refs = refs("api_token", "svc-token-<env>");

    let err = resolve_secret(Some(&client), &secret_refs, "api_token", "dev")
        .await
        .unwrap_err();

    assert!(matches!(err, SecretError::Api { status: 500, .. }));
}
