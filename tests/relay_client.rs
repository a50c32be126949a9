//! Webhook relay behaviour against a mock automation endpoint.
//!
//! Every failure mode must come back as displayable text, never an error.

use otpchat::relay::{RelayClient, TIMEOUT_REPLY};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RelayClient {
    RelayClient::new(format!("{}/webhook", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn posts_message_and_email_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_json(serde_json::json!({
            "message": "hello",
            "user_email": "a@b.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output": "hi"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).send("hello", "a@b.com").await, "hi");
}

#[tokio::test]
async fn response_key_beats_output_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "third",
            "output": "second",
            "response": "first"
        })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).send("q", "a@b.com").await, "first");
}

#[tokio::test]
async fn mapping_without_known_keys_is_stringified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "foo": "bar"
        })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).send("q", "a@b.com").await, r#"{"foo":"bar"}"#);
}

#[tokio::test]
async fn non_mapping_body_is_stringified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["a", "b"])))
        .mount(&server)
        .await;

    assert_eq!(client(&server).send("q", "a@b.com").await, r#"["a","b"]"#);
}

#[tokio::test]
async fn error_status_becomes_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    assert_eq!(
        client(&server).send("q", "a@b.com").await,
        "Error: Received status code 500"
    );
}

#[tokio::test]
async fn slow_webhook_times_out_with_retry_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"output": "too late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let relay = RelayClient::new(
        format!("{}/webhook", server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();
    assert_eq!(relay.send("q", "a@b.com").await, TIMEOUT_REPLY);
}

#[tokio::test]
async fn unparseable_body_is_reported_inline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let reply = client(&server).send("q", "a@b.com").await;
    assert!(reply.starts_with("Error: "), "got {reply:?}");
    assert_ne!(reply, TIMEOUT_REPLY);
}

#[tokio::test]
async fn unreachable_webhook_is_reported_inline() {
    // Port 9 (discard) is closed on test hosts; the connect fails fast.
    let relay = RelayClient::new("http://127.0.0.1:9/webhook", Duration::from_secs(2)).unwrap();
    let reply = relay.send("q", "a@b.com").await;
    assert!(reply.starts_with("Error: "), "got {reply:?}");
}
