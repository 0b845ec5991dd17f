//! Scripted collaborators for exercising the chat flow without a network
//! or database.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream test suites.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::stream;

use showtalk_core::error::ShowtalkError;
use showtalk_core::types::{ChatMessage, EpisodeRecord, LlmReply, ResponseChunk};
use showtalk_llm::{ChatOptions, ChunkStream, LlmClient, LlmError, LlmProvider};
use showtalk_storage::EpisodeStore;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn scripted_failure(body: &str) -> LlmError {
    LlmError::Server {
        status: 500,
        body: body.to_string(),
    }
}

// =============================================================================
// ScriptedLlm
// =============================================================================

/// One call received by [`ScriptedLlm`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub streamed: bool,
}

/// An [`LlmClient`] with canned replies that records every call.
///
/// `chat` returns the scripted reply text; `chat_stream` yields the
/// scripted chunks, optionally followed by an error.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    reply: String,
    chat_error: Option<String>,
    chunks: Vec<ResponseChunk>,
    stream_error: Option<String>,
    open_error: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Self::default()
        }
    }

    pub fn with_stream(mut self, chunks: Vec<ResponseChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn failing_chat(mut self, message: &str) -> Self {
        self.chat_error = Some(message.to_string());
        self
    }

    pub fn failing_stream_open(mut self, message: &str) -> Self {
        self.open_error = Some(message.to_string());
        self
    }

    pub fn failing_stream_after(mut self, message: &str) -> Self {
        self.stream_error = Some(message.to_string());
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, messages: &[ChatMessage], streamed: bool) {
        lock(&self.calls).push(RecordedCall {
            messages: messages.to_vec(),
            streamed,
        });
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<LlmReply, LlmError> {
        self.record(messages, false);
        match &self.chat_error {
            Some(msg) => Err(scripted_failure(msg)),
            None => Ok(LlmReply {
                content: self.reply.clone(),
                reasoning: String::new(),
            }),
        }
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<ChunkStream, LlmError> {
        self.record(messages, true);
        if let Some(msg) = &self.open_error {
            return Err(scripted_failure(msg));
        }

        let mut items: Vec<Result<ResponseChunk, LlmError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        if let Some(msg) = &self.stream_error {
            items.push(Err(scripted_failure(msg)));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

// =============================================================================
// ScriptedProvider
// =============================================================================

/// An [`LlmProvider`] that hands out a fixed client, or reports a missing key.
pub struct ScriptedProvider {
    client: Option<Arc<ScriptedLlm>>,
    key_var: String,
}

impl ScriptedProvider {
    pub fn with_client(client: Arc<ScriptedLlm>) -> Self {
        Self {
            client: Some(client),
            key_var: "API_KEY".to_string(),
        }
    }

    pub fn missing_key(var: &str) -> Self {
        Self {
            client: None,
            key_var: var.to_string(),
        }
    }
}

impl LlmProvider for ScriptedProvider {
    fn client(&self) -> Result<Arc<dyn LlmClient>, LlmError> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => Err(LlmError::MissingApiKey {
                var: self.key_var.clone(),
            }),
        }
    }
}

// =============================================================================
// MemoryEpisodeStore
// =============================================================================

/// An in-memory [`EpisodeStore`] that records every query.
#[derive(Debug, Default)]
pub struct MemoryEpisodeStore {
    episodes: Vec<EpisodeRecord>,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl MemoryEpisodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_episode(mut self, title: &str, description: &str, rating: f64) -> Self {
        self.episodes.push(EpisodeRecord {
            title: title.to_string(),
            description: description.to_string(),
            rating,
        });
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Keywords received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

impl EpisodeStore for MemoryEpisodeStore {
    fn find_episodes(&self, title_fragment: &str) -> Result<Vec<EpisodeRecord>, ShowtalkError> {
        lock(&self.queries).push(title_fragment.to_string());
        if let Some(msg) = &self.failure {
            return Err(ShowtalkError::Storage(msg.clone()));
        }
        let needle = title_fragment.to_lowercase();
        Ok(self
            .episodes
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<u64, ShowtalkError> {
        Ok(self.episodes.len() as u64)
    }
}
