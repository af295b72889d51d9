//! HTTP round trips against a one-shot local server.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use outreach::providers::openai::OpenAiProvider;
use outreach::providers::{
    check_http_response, sanitize_http_error_body, CompletionRequest, LlmProvider, Message,
    ProviderError,
};

/// Read one request: headers, then `Content-Length` bytes of body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut data: Vec<u8> = Vec::new();
    let mut buf = [0_u8; 4096];
    loop {
        let read = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        data.extend_from_slice(&buf[..read]);
        let text = String::from_utf8_lossy(&data).into_owned();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    line.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|value| value.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if data.len() >= header_end.saturating_add(4).saturating_add(content_length) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Serve one response; the received request arrives on the returned channel.
async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose local addr");
    let (tx, rx) = oneshot::channel();

    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = tx.send(request);
        }
    });

    (format!("http://{addr}/v1/chat/completions"), rx)
}

fn provider(endpoint: &str) -> OpenAiProvider {
    OpenAiProvider::new(
        "openai/gpt-test".to_owned(),
        "gpt-test".to_owned(),
        "sk-test-key".to_owned(),
        endpoint,
    )
    .expect("endpoint should parse")
}

fn request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user("Write the sequence.")],
        system: Some("You write outreach.".to_owned()),
        max_tokens: Some(128),
        temperature: None,
        json_output: false,
    }
}

#[tokio::test]
async fn provider_posts_bearer_auth_and_parses_reply() {
    let body = r#"{"model":"gpt-test","choices":[{"message":{"content":"Email 1"},"finish_reason":"stop"}]}"#;
    let (url, received) = serve_once("200 OK", body).await;

    let response = provider(&url)
        .complete(request())
        .await
        .expect("completion should succeed");
    assert_eq!(response.text, "Email 1");

    let raw = received.await.expect("request should be captured");
    let lower = raw.to_ascii_lowercase();
    assert!(lower.starts_with("post /v1/chat/completions"));
    assert!(lower.contains("authorization: bearer sk-test-key"));
    assert!(raw.contains("\"model\":\"gpt-test\""));
    assert!(raw.contains("Write the sequence."));
}

#[tokio::test]
async fn provider_surfaces_http_status() {
    let (url, _received) = serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#).await;
    let err = provider(&url)
        .complete(request())
        .await
        .expect_err("429 should fail");
    match err {
        ProviderError::HttpStatus { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn check_http_response_redacts_key_like_values() {
    let raw_key = "pplx-abcdefghijklmnopqrstuvwxyz";
    let (url, _received) = serve_once("500 Internal Server Error", &format!("bad key {raw_key}")).await;

    let response = reqwest::get(url).await.expect("request should complete");
    match check_http_response(response).await {
        Err(ProviderError::HttpStatus { body, .. }) => {
            assert!(!body.contains(raw_key));
            assert!(body.contains("[REDACTED]"));
        }
        other => panic!("expected http status error, got: {other:?}"),
    }
}

#[test]
fn sanitize_truncates_and_collapses() {
    let long = "x".repeat(400);
    assert!(sanitize_http_error_body(&long).ends_with("...[truncated]"));
    assert_eq!(sanitize_http_error_body("a \n\n  b"), "a b");
    assert_eq!(
        sanitize_http_error_body("key sk-proj-ABCDEFGHIJKLMNOP rejected"),
        "key [REDACTED] rejected"
    );
}
