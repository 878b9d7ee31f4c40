//! Integration tests for the API prober.
//!
//! These run against a local wiremock server so status classification,
//! header shaping and transport failures are exercised over real HTTP.

use std::time::Duration;

use connection_probe::probes::{probe_api, API_TIMEOUT};
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_2xx_statuses_pass() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/submitted"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let url = format!("{}/health", server.uri());
    let outcome = probe_api(&client(), &url, None, API_TIMEOUT).await;
    assert!(outcome.ok);
    assert_eq!(outcome.details, format!("API probe {url} -> HTTP 200"));

    let url = format!("{}/submitted", server.uri());
    let outcome = probe_api(&client(), &url, None, API_TIMEOUT).await;
    assert!(outcome.ok);
    assert_eq!(outcome.details, format!("API probe {url} -> HTTP 204"));
}

#[tokio::test]
async fn test_error_statuses_fail_with_status_in_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/unavailable"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url = format!("{}/broken", server.uri());
    let outcome = probe_api(&client(), &url, None, API_TIMEOUT).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.details, format!("API probe {url} -> HTTP 500"));

    let url = format!("{}/unavailable", server.uri());
    let outcome = probe_api(&client(), &url, None, API_TIMEOUT).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.details, format!("API probe {url} -> HTTP 503"));
}

#[tokio::test]
async fn test_auth_failures_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let url = server.uri();
    let outcome = probe_api(&client(), &url, Some("expired-token"), API_TIMEOUT).await;

    assert!(!outcome.ok);
    assert!(outcome.details.ends_with("HTTP 401"));
}

#[tokio::test]
async fn test_unfollowed_redirects_fail() {
    let server = MockServer::start().await;
    // A 302 without a Location header stays a 302 at the client.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let outcome = probe_api(&client(), &server.uri(), None, API_TIMEOUT).await;

    assert!(!outcome.ok);
    assert!(outcome.details.ends_with("HTTP 302"));
}

#[tokio::test]
async fn test_bearer_token_is_sent_as_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/v1/ping", server.uri());
    let outcome = probe_api(&client(), &url, Some("tok-123"), API_TIMEOUT).await;

    assert!(outcome.ok);
}

#[tokio::test]
async fn test_anonymous_probe_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = probe_api(&client(), &server.uri(), None, API_TIMEOUT).await;
    assert!(outcome.ok);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_connection_refused_is_a_failing_outcome() {
    // Port 1 is reserved and closed on any sane host.
    let url = "http://127.0.0.1:1/health";
    let outcome = probe_api(&client(), url, None, API_TIMEOUT).await;

    assert!(!outcome.ok);
    assert!(outcome
        .details
        .starts_with(&format!("API probe failed for {url} ->")));
}

#[tokio::test]
async fn test_slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let outcome = probe_api(&client(), &server.uri(), None, Duration::from_millis(250)).await;

    assert!(!outcome.ok);
    assert!(outcome.details.starts_with("API probe failed for"));
}

#[tokio::test]
async fn test_relative_url_fails_without_any_network_call() {
    let outcome = probe_api(&client(), "/ping", None, API_TIMEOUT).await;

    assert!(!outcome.ok);
    assert!(outcome.details.starts_with("API probe failed for /ping ->"));
}
