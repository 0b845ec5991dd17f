//! Error types for the LLM collaborator.

/// Errors from talking to the chat completions endpoint.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{var} environment variable not set")]
    MissingApiKey { var: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM server error: HTTP {status} - {body}")]
    Server { status: u16, body: String },

    #[error("SSE stream error: {0}")]
    Stream(String),

    #[error("LLM returned no choices")]
    EmptyResponse,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
