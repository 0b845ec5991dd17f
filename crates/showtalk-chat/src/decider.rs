//! Search decision: ask the model whether an utterance needs episode data.
//!
//! The model answers in free text. [`parse_decision`] turns that text into a
//! [`SearchDecision`] using a fixed precedence of token rules:
//!
//! 1. a standalone `NO` with no standalone `YES` means no search;
//! 2. `YES` followed by whitespace and a word searches that word, lowercased;
//! 3. a standalone `YES` with no word searches the fallback keyword;
//! 4. anything else means no search.
//!
//! All matching is case-insensitive and respects word boundaries.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use showtalk_core::types::SearchDecision;
use showtalk_llm::{ChatOptions, LlmClient};

use crate::error::ChatError;
use crate::prompts::classification_messages;

static NO_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNO\b").expect("Invalid decision regex"));

static YES_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bYES\b").expect("Invalid decision regex"));

static YES_WITH_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bYES\s+(\w+)").expect("Invalid decision regex"));

// -----------------------------------------------------------------
// Rules
// -----------------------------------------------------------------

/// Rule 1: the reply says NO and never says YES.
pub fn declines(reply: &str) -> bool {
    NO_TOKEN.is_match(reply) && !YES_TOKEN.is_match(reply)
}

/// Rule 2: the word following the first `YES`, lowercased.
pub fn keyword_after_yes(reply: &str) -> Option<String> {
    YES_WITH_WORD
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Rule 3: the reply says YES somewhere.
pub fn affirms(reply: &str) -> bool {
    YES_TOKEN.is_match(reply)
}

/// Apply the rules in order to a classifier reply.
pub fn parse_decision(reply: &str, fallback_keyword: &str) -> SearchDecision {
    let reply = reply.trim();

    if declines(reply) {
        return SearchDecision::NoSearch;
    }
    if let Some(keyword) = keyword_after_yes(reply) {
        return SearchDecision::Search { keyword };
    }
    if affirms(reply) {
        return SearchDecision::Search {
            keyword: fallback_keyword.to_string(),
        };
    }
    SearchDecision::NoSearch
}

// -----------------------------------------------------------------
// SearchDecider
// -----------------------------------------------------------------

/// Classifies utterances by asking the model, then parsing its reply.
#[derive(Debug, Clone)]
pub struct SearchDecider {
    fallback_keyword: String,
}

impl SearchDecider {
    pub fn new(fallback_keyword: impl Into<String>) -> Self {
        Self {
            fallback_keyword: fallback_keyword.into(),
        }
    }

    /// Run one non-streaming classification call and parse the reply.
    ///
    /// Collaborator failures and empty replies are returned as errors.
    pub async fn decide(
        &self,
        utterance: &str,
        llm: &dyn LlmClient,
        options: &ChatOptions,
    ) -> Result<SearchDecision, ChatError> {
        let reply = llm.chat(&classification_messages(utterance), options).await?;
        let text = reply.content.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyClassification);
        }

        let decision = parse_decision(text, &self.fallback_keyword);
        debug!(reply = %text, ?decision, "Search decision");
        Ok(decision)
    }
}
