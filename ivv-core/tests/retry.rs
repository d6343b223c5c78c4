//! Behaviour of the retrying client against a mock HTTP server.

use std::time::{Duration, Instant};

use ivv_core::{RetryPolicy, RetryingClient, SourceKind};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(max_attempts: u32, base_delay_ms: u64) -> RetryingClient {
    RetryingClient::new(RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(base_delay_ms),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_returns_payload_after_transient_failures() {
    let mock_server = MockServer::start().await;

    // First two attempts fail, the third succeeds.
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(3, 50);
    let url = format!("{}/data", mock_server.uri());

    let started = Instant::now();
    let body = client.get_json(SourceKind::Weather, &url, &[], &[]).await;
    let elapsed = started.elapsed();

    assert_eq!(body, Some(json!({ "ok": true })));
    // Backoff after attempt 1 is 50ms, after attempt 2 is 100ms.
    assert!(
        elapsed >= Duration::from_millis(150),
        "expected at least 150ms of backoff, got {elapsed:?}"
    );
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = client(4, 5);
    let url = format!("{}/down", mock_server.uri());

    let body = client.get_json(SourceKind::Currency, &url, &[], &[]).await;

    assert_eq!(body, None);
}

#[tokio::test]
async fn test_client_errors_are_retried_too() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(2, 5);
    let url = format!("{}/missing", mock_server.uri());

    assert_eq!(client.get_json(SourceKind::LocalTime, &url, &[], &[]).await, None);
}

#[tokio::test]
async fn test_invalid_json_counts_as_failed_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(2, 5);
    let url = format!("{}/garbled", mock_server.uri());

    assert_eq!(client.get_json(SourceKind::Weather, &url, &[], &[]).await, None);
}

#[tokio::test]
async fn test_unreachable_host_returns_none() {
    // Reserve a free port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}/nothing");

    let client = client(2, 5);
    let body = client.get_json(SourceKind::Weather, &url, &[], &[]).await;

    assert_eq!(body, None);
}

#[tokio::test]
async fn test_sends_query_params_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rates"))
        .and(query_param("base", "USD"))
        .and(query_param("symbols", "GBP"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": { "GBP": 0.79 } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(1, 5);
    let url = format!("{}/rates", mock_server.uri());
    let params = [("base", "USD".to_string()), ("symbols", "GBP".to_string())];

    let body = client
        .get_json(SourceKind::Currency, &url, &params, &[("x-api-key", "secret")])
        .await;

    assert_eq!(body, Some(json!({ "rates": { "GBP": 0.79 } })));
}
