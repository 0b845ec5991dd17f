//! Error types for the conversational core.

use showtalk_core::error::ShowtalkError;
use showtalk_llm::LlmError;

/// Errors from handling a chat message.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is required")]
    EmptyMessage,
    /// The server cannot reach the model as configured, e.g. no API key.
    #[error("{0}")]
    Configuration(String),
    #[error("search classifier returned an empty reply")]
    EmptyClassification,
    #[error("LLM error: {0}")]
    Llm(LlmError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey { .. } => ChatError::Configuration(err.to_string()),
            other => ChatError::Llm(other),
        }
    }
}

impl From<ShowtalkError> for ChatError {
    fn from(err: ShowtalkError) -> Self {
        ChatError::Storage(err.to_string())
    }
}
