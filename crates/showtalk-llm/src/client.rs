//! The LLM client seam.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use showtalk_core::config::LlmConfig;
use showtalk_core::types::{ChatMessage, LlmReply, ReasoningLevel, ResponseChunk};

use crate::error::LlmError;

/// Incremental reply deltas in generation order.
///
/// The stream ends when the model is done; there is no explicit end item.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ResponseChunk, LlmError>> + Send>>;

/// Per-call generation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatOptions {
    /// Keep reasoning text in the reply. When false it is dropped.
    pub show_thinking: bool,
    pub reasoning_level: Option<ReasoningLevel>,
}

impl From<&LlmConfig> for ChatOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            show_thinking: config.show_thinking,
            reasoning_level: config.reasoning_level,
        }
    }
}

/// A chat model that answers role-tagged message lists.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Wait for the full reply.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<LlmReply, LlmError>;

    /// Open a streamed reply.
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChunkStream, LlmError>;
}
