//! Chat orchestrator: validates a message, chooses grounding, and answers.
//!
//! Two strategies are supported. `Naive` always searches with the raw
//! message and returns one complete reply. `Decided` asks the model whether
//! to search first and streams the answer as [`AnswerEvent`]s.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use showtalk_core::config::ShowtalkConfig;
use showtalk_core::types::{ChatMessage, GroundingStrategy, LlmReply, SearchDecision};
use showtalk_llm::{ChatOptions, LlmClient, LlmProvider};
use showtalk_storage::EpisodeStore;

use crate::composer::compose;
use crate::decider::SearchDecider;
use crate::error::ChatError;
use crate::gateway::SearchGateway;
use crate::prompts::{direct_messages, grounded_messages};

/// One event pushed to the caller while an answer streams.
///
/// Serializes as `{"content": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerEvent {
    Content(String),
    Error(String),
}

/// Live answer events. An `Error` event is always the last one.
pub type AnswerStream = Pin<Box<dyn Stream<Item = AnswerEvent> + Send>>;

/// The result of handling one message.
pub enum ChatReply {
    Complete(LlmReply),
    Stream(AnswerStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Complete(reply) => f.debug_tuple("Complete").field(reply).finish(),
            ChatReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Per-request coordinator. Holds no state across requests.
pub struct ChatOrchestrator {
    strategy: GroundingStrategy,
    decider: SearchDecider,
    gateway: SearchGateway,
    llm: Arc<dyn LlmProvider>,
}

impl ChatOrchestrator {
    pub fn new(
        strategy: GroundingStrategy,
        decider: SearchDecider,
        gateway: SearchGateway,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            strategy,
            decider,
            gateway,
            llm,
        }
    }

    /// Wire an orchestrator from configuration and injected collaborators.
    pub fn from_config(
        config: &ShowtalkConfig,
        store: Arc<dyn EpisodeStore>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self::new(
            config.chat.strategy,
            SearchDecider::new(config.chat.decision_fallback_keyword.clone()),
            SearchGateway::new(store, config.search.default_keyword.clone()),
            llm,
        )
    }

    pub fn strategy(&self) -> GroundingStrategy {
        self.strategy
    }

    pub fn gateway(&self) -> &SearchGateway {
        &self.gateway
    }

    /// Handle one user message.
    ///
    /// Validation and credential checks run before any collaborator call.
    pub async fn handle(&self, message: &str) -> Result<ChatReply, ChatError> {
        let message = validate_message(message)?;
        let client = self.llm.client()?;
        let options = self.llm.options();

        match self.strategy {
            GroundingStrategy::Naive => self
                .answer_naive(message, client.as_ref(), &options)
                .await
                .map(ChatReply::Complete),
            GroundingStrategy::Decided => {
                let decision = self
                    .decider
                    .decide(message, client.as_ref(), &options)
                    .await?;
                let messages = self.build_messages(message, &decision).await?;
                Ok(ChatReply::Stream(stream_answer(client, messages, options)))
            }
        }
    }

    /// Build the answer prompt for a decision.
    pub async fn build_messages(
        &self,
        message: &str,
        decision: &SearchDecision,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        match decision {
            SearchDecision::Search { keyword } => self.grounded(keyword, message).await,
            SearchDecision::NoSearch => {
                info!("Answering without episode search");
                Ok(direct_messages(message))
            }
        }
    }

    async fn grounded(&self, keyword: &str, message: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let records = self.gateway.search_async(keyword).await?;
        Ok(grounded_messages(&compose(&records), message))
    }

    async fn answer_naive(
        &self,
        message: &str,
        client: &dyn LlmClient,
        options: &ChatOptions,
    ) -> Result<LlmReply, ChatError> {
        let messages = self.grounded(message, message).await?;
        Ok(client.chat(&messages, options).await?)
    }
}

/// Trim the message and reject it if nothing is left.
pub fn validate_message(message: &str) -> Result<&str, ChatError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    Ok(trimmed)
}

/// Stream the answer, forwarding each non-empty content delta.
///
/// A failure while opening or reading the model stream becomes a single
/// `Error` event and ends the stream. Dropping the returned stream drops
/// the model stream with it.
fn stream_answer(
    client: Arc<dyn LlmClient>,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
) -> AnswerStream {
    Box::pin(stream! {
        let mut chunks = match client.chat_stream(&messages, &options).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(error = %e, "Failed to open answer stream");
                yield AnswerEvent::Error(e.to_string());
                return;
            }
        };

        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(text) = chunk.content_delta() {
                        yield AnswerEvent::Content(text.to_string());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Answer stream failed");
                    yield AnswerEvent::Error(e.to_string());
                    return;
                }
            }
        }
    })
}
