//! Integration tests for signed webhook delivery.
//!
//! A one-shot HTTP responder on a local port stands in for the receiving
//! endpoint, so the real `reqwest` client and signing path are exercised.

use std::time::Duration;

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use cider_cellar::webhooks::{
    DELIVERY_HEADER, EVENT_HEADER, LOW_STOCK_EVENT, RetryDecision, RetryPolicy, SIGNATURE_HEADER,
    TIMESTAMP_HEADER, WebhookClient, WebhookError, sign, verify,
};
use cider_cellar_core::WebhookDeliveryId;

const SECRET: &str = "q7Lw2Zr9Xb4Kd8Vm1Tn6Hy3Jc5Fs0Pg";

fn secret() -> SecretString {
    SecretString::from(SECRET)
}

/// A request as seen by the test endpoint.
struct ReceivedRequest {
    head: String,
    body: String,
}

impl ReceivedRequest {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Accept one connection, capture the request, answer with `response`.
async fn respond_once(response: &'static str) -> (Url, JoinHandle<ReceivedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let url = Url::parse(&format!("http://{addr}/hooks/cellar")).expect("valid url");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];

        let (head_len, body_len) = loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(chunk.get(..n).expect("read within buffer"));

            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(buf.get(..pos).expect("head in buffer"));
                let body_len = head
                    .lines()
                    .find_map(|line| {
                        let (key, value) = line.split_once(':')?;
                        key.trim()
                            .eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                break (pos + 4, body_len);
            }
        };

        while buf.len() < head_len + body_len {
            let n = socket.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(chunk.get(..n).expect("read within buffer"));
        }

        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();

        let head = String::from_utf8_lossy(buf.get(..head_len - 4).expect("head in buffer"));
        let body = String::from_utf8_lossy(
            buf.get(head_len..head_len + body_len)
                .expect("body in buffer"),
        );
        ReceivedRequest {
            head: head.into_owned(),
            body: body.into_owned(),
        }
    });

    (url, handle)
}

// =============================================================================
// Signing
// =============================================================================

#[test]
fn test_signature_round_trip() {
    let body = r#"{"event":"inventory.low_stock"}"#;
    let signature = sign(&secret(), 1_727_776_800, body).expect("sign");

    assert!(signature.starts_with("sha256="));
    assert!(verify(&secret(), "1727776800", body, &signature, 1_727_776_830).is_ok());
}

#[test]
fn test_tampered_body_rejected() {
    let signature = sign(&secret(), 1_727_776_800, r#"{"alerts":[]}"#).expect("sign");
    let result = verify(
        &secret(),
        "1727776800",
        r#"{"alerts":[1]}"#,
        &signature,
        1_727_776_800,
    );
    assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
}

#[test]
fn test_stale_timestamp_rejected() {
    let body = "{}";
    let signature = sign(&secret(), 1_727_776_800, body).expect("sign");
    let result = verify(&secret(), "1727776800", body, &signature, 1_727_776_800 + 301);
    assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
}

// =============================================================================
// Retry Policy
// =============================================================================

#[test]
fn test_default_schedule_gives_up_after_five_attempts() {
    let policy = RetryPolicy::default();
    let schedule: Vec<RetryDecision> = (1..=5).map(|n| policy.after_failure(n)).collect();

    assert_eq!(
        schedule,
        vec![
            RetryDecision::RetryAfter(Duration::from_secs(60)),
            RetryDecision::RetryAfter(Duration::from_secs(120)),
            RetryDecision::RetryAfter(Duration::from_secs(240)),
            RetryDecision::RetryAfter(Duration::from_secs(480)),
            RetryDecision::GiveUp,
        ]
    );
}

#[test]
fn test_backoff_capped_at_one_hour() {
    let policy = RetryPolicy::with_max_attempts(20);
    assert_eq!(policy.delay_after(7), Duration::from_secs(3600));
    assert_eq!(policy.delay_after(19), Duration::from_secs(3600));
}

// =============================================================================
// HTTP Delivery
// =============================================================================

#[tokio::test]
async fn test_send_posts_signed_body() {
    let (url, server) =
        respond_once("HTTP/1.1 204 No Content\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await;
    let client = WebhookClient::new(url, secret(), Duration::from_secs(5)).expect("client");
    let payload = serde_json::json!({"event": LOW_STOCK_EVENT, "alerts": []});

    client
        .send(WebhookDeliveryId::new(42), LOW_STOCK_EVENT, &payload)
        .await
        .expect("delivery accepted");

    let request = server.await.expect("server task");
    assert!(request.head.starts_with("POST /hooks/cellar "));
    assert_eq!(request.header(EVENT_HEADER).as_deref(), Some(LOW_STOCK_EVENT));
    assert_eq!(request.header(DELIVERY_HEADER).as_deref(), Some("42"));
    assert_eq!(
        request.header("content-type").as_deref(),
        Some("application/json")
    );

    let received: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
    assert_eq!(received, payload);

    let timestamp = request.header(TIMESTAMP_HEADER).expect("timestamp header");
    let signature = request.header(SIGNATURE_HEADER).expect("signature header");
    let now = chrono::Utc::now().timestamp();
    assert!(verify(&secret(), &timestamp, &request.body, &signature, now).is_ok());
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let (url, server) = respond_once(
        "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbusy",
    )
    .await;
    let client = WebhookClient::new(url, secret(), Duration::from_secs(5)).expect("client");

    let err = client
        .send(WebhookDeliveryId::new(1), LOW_STOCK_EVENT, &serde_json::json!({}))
        .await
        .expect_err("503 is a failure");

    assert!(matches!(
        err,
        WebhookError::Status { status: 503, ref body } if body == "busy"
    ));
    server.await.expect("server task");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/hooks")).expect("valid url");
    let client = WebhookClient::new(url, secret(), Duration::from_secs(2)).expect("client");

    let err = client
        .send(WebhookDeliveryId::new(1), LOW_STOCK_EVENT, &serde_json::json!({}))
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, WebhookError::Request(_)));
}
