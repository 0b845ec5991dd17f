use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Speaker of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,
    /// The human asking questions.
    User,
    /// The model's previous replies.
    Assistant,
}

/// How much the model is asked to think before answering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningLevel {
    Low,
    Medium,
    High,
}

impl ReasoningLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningLevel::Low => "low",
            ReasoningLevel::Medium => "medium",
            ReasoningLevel::High => "high",
        }
    }
}

/// Which grounding flow the chat endpoint runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingStrategy {
    /// Always search with the raw message and return one complete reply.
    Naive,
    /// Let the model decide whether and what to search, then stream the answer.
    #[default]
    Decided,
}

// =============================================================================
// Messages
// =============================================================================

/// A single role-tagged message sent to the LLM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// Episodes
// =============================================================================

/// An episode joined with its review rating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub title: String,
    #[serde(rename = "descr")]
    pub description: String,
    #[serde(rename = "imdb_rating")]
    pub rating: f64,
}

// =============================================================================
// Search decision
// =============================================================================

/// Outcome of asking the model whether an utterance needs episode data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchDecision {
    /// Answer conversationally without touching the catalog.
    NoSearch,
    /// Search episode titles for `keyword`.
    Search { keyword: String },
}

impl SearchDecision {
    pub fn should_search(&self) -> bool {
        matches!(self, SearchDecision::Search { .. })
    }

    /// The keyword to search, present only when a search is wanted.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            SearchDecision::NoSearch => None,
            SearchDecision::Search { keyword } => Some(keyword),
        }
    }
}

// =============================================================================
// LLM output
// =============================================================================

/// A complete, non-streamed model reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmReply {
    pub content: String,
    pub reasoning: String,
}

/// One incremental piece of a streamed reply. Either field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ResponseChunk {
    /// The content delta, if it is present and non-empty.
    pub fn content_delta(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}
