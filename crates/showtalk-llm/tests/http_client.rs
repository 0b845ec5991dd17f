//! HTTP tests for the chat completions client against local servers.

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use showtalk_core::config::LlmConfig;
use showtalk_core::types::{ChatMessage, ResponseChunk};
use showtalk_llm::{http_client, ChatOptions, HttpLlmClient, LlmClient, LlmError};

// =============================================================================
// Helpers
// =============================================================================

fn client_for(base_url: &str, timeout_secs: u64) -> HttpLlmClient {
    let config = LlmConfig {
        base_url: base_url.to_string(),
        model: "tiny".into(),
        timeout_secs,
        ..LlmConfig::default()
    };
    HttpLlmClient::with_http(http_client(&config).unwrap(), &config, "secret")
}

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")]
}

fn delta(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "object": "chat.completion.chunk",
            "choices": [{"delta": {"content": content}}]
        })
    )
}

fn collect_text(chunks: Vec<Result<ResponseChunk, LlmError>>) -> Result<String, LlmError> {
    let mut text = String::new();
    for chunk in chunks {
        if let Some(c) = chunk?.content {
            text.push_str(&c);
        }
    }
    Ok(text)
}

/// Read one HTTP request, head and body, from the socket.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        let n = socket.read(&mut tmp).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return;
            }
        }
    }
}

/// Serve one SSE answer whose deltas arrive `gap` apart.
async fn serve_slow_stream(deltas: Vec<&'static str>, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        for d in deltas {
            socket.write_all(delta(d).as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(gap).await;
        }
        socket.write_all(b"data: [DONE]\n\n").await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}/v1", addr)
}

// =============================================================================
// Non-streaming
// =============================================================================

#[tokio::test]
async fn test_chat_decodes_reply_and_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(serde_json::json!({"model": "tiny", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "YES wedding"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&format!("{}/v1", server.uri()), 30);
    let reply = client
        .chat(&messages(), &ChatOptions::default())
        .await
        .unwrap();
    assert_eq!(reply.content, "YES wedding");
    assert_eq!(reply.reasoning, "");
}

#[tokio::test]
async fn test_chat_maps_error_status_to_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = client_for(&format!("{}/v1", server.uri()), 30);
    let err = client
        .chat(&messages(), &ChatOptions::default())
        .await
        .unwrap_err();
    match err {
        LlmError::Server { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_stream_maps_error_status_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = client_for(&format!("{}/v1", server.uri()), 30);
    let result = client.chat_stream(&messages(), &ChatOptions::default()).await;
    assert!(matches!(result, Err(LlmError::Server { status: 401, .. })));
}

#[tokio::test]
async fn test_chat_is_bounded_by_total_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"choices": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(&format!("{}/v1", server.uri()), 1);
    let err = client
        .chat(&messages(), &ChatOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Http(ref e) if e.is_timeout()), "{:?}", err);
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn test_chat_stream_decodes_event_stream_body() {
    let body = [
        delta("Kourtney\u{2019}s "),
        delta("caf\u{e9}"),
        "data: [DONE]\n\n".to_string(),
    ]
    .concat();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(serde_json::json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&format!("{}/v1", server.uri()), 30);
    let stream = client
        .chat_stream(&messages(), &ChatOptions::default())
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 2);
    assert_eq!(collect_text(chunks).unwrap(), "Kourtney\u{2019}s caf\u{e9}");
}

#[tokio::test]
async fn test_slow_stream_outlives_timeout() {
    // Three deltas 600 ms apart take longer than the 1 s timeout in total,
    // but no single read waits that long.
    let base_url = serve_slow_stream(vec!["t0", "t1", "t2"], Duration::from_millis(600)).await;
    let client = client_for(&base_url, 1);

    let stream = client
        .chat_stream(&messages(), &ChatOptions::default())
        .await
        .unwrap();
    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(collect_text(chunks).unwrap(), "t0t1t2");
}
