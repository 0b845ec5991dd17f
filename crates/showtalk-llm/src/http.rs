//! OpenAI-compatible chat completions over HTTP.
//!
//! Non-streaming calls decode one JSON body. Streaming calls decode SSE
//! `data:` events of `chat.completion.chunk` objects until `[DONE]`.

use std::fmt::Display;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use showtalk_core::config::LlmConfig;
use showtalk_core::types::{ChatMessage, LlmReply, ResponseChunk};

use crate::client::{ChatOptions, ChunkStream, LlmClient};
use crate::error::LlmError;

const DONE_MARKER: &str = "[DONE]";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: WireMessage,
}

/// Message or delta body. Providers disagree on the reasoning field name.
#[derive(Debug, Default, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

impl WireMessage {
    fn into_chunk(self, show_thinking: bool) -> ResponseChunk {
        let reasoning = if show_thinking {
            self.reasoning_content.or(self.reasoning)
        } else {
            None
        };
        ResponseChunk {
            content: self.content,
            reasoning,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: WireMessage,
}

// =============================================================================
// HttpLlmClient
// =============================================================================

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpLlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    /// Total deadline for non-streaming calls.
    request_timeout: Duration,
}

impl HttpLlmClient {
    /// Build a client sharing an existing connection pool.
    pub fn with_http(http: reqwest::Client, config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            request_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| LlmError::InvalidRequest(format!("bad API key header: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn request_body<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &ChatOptions,
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            stream,
            reasoning_effort: options.reasoning_level.map(|l| l.as_str()),
        }
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, stream, messages = messages.len(), "LLM chat request");

        let mut request = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&self.request_body(messages, options, stream));
        // Streams are bounded by the client's idle read timeout instead.
        if !stream {
            request = request.timeout(self.request_timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<LlmReply, LlmError> {
        let response = self.send(messages, options, false).await?;
        let completion: ChatCompletionResponse = response.json().await?;
        reply_from_completion(completion, options.show_thinking)
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChunkStream, LlmError> {
        let response = self.send(messages, options, true).await?;
        Ok(Box::pin(decode_chunks(
            response.bytes_stream(),
            options.show_thinking,
        )))
    }
}

fn reply_from_completion(
    completion: ChatCompletionResponse,
    show_thinking: bool,
) -> Result<LlmReply, LlmError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;
    let chunk = choice.message.into_chunk(show_thinking);
    Ok(LlmReply {
        content: chunk.content.unwrap_or_default(),
        reasoning: chunk.reasoning.unwrap_or_default(),
    })
}

/// Parse one SSE payload. `None` means the end marker was seen.
fn parse_payload(data: &str, show_thinking: bool) -> Result<Option<Vec<ResponseChunk>>, LlmError> {
    if data.trim() == DONE_MARKER {
        return Ok(None);
    }
    let chunk: StreamChunk = serde_json::from_str(data)?;
    Ok(Some(
        chunk
            .choices
            .into_iter()
            .map(|c| c.delta.into_chunk(show_thinking))
            .collect(),
    ))
}

/// Turn a raw SSE byte stream into response chunks.
///
/// Stops at `[DONE]` or when the body ends. The first transport or decode
/// error is yielded and ends the stream.
fn decode_chunks<S, B, E>(
    bytes: S,
    show_thinking: bool,
) -> impl Stream<Item = Result<ResponseChunk, LlmError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    LlmError: From<E>,
{
    try_stream! {
        let mut events = Box::pin(bytes.eventsource());

        while let Some(event) = events.next().await {
            let event = event.map_err(stream_error)?;
            match parse_payload(&event.data, show_thinking)? {
                Some(chunks) => {
                    for chunk in chunks {
                        yield chunk;
                    }
                }
                None => break,
            }
        }
    }
}

fn stream_error<E>(err: EventStreamError<E>) -> LlmError
where
    E: Display,
    LlmError: From<E>,
{
    match err {
        EventStreamError::Transport(e) => LlmError::from(e),
        other => LlmError::Stream(other.to_string()),
    }
}
