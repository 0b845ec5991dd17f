//! Conversational core for showtalk.
//!
//! Decides whether a question needs episode data, fetches and renders
//! that data as grounding context, and drives the answering LLM call.

pub mod composer;
pub mod decider;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use composer::compose;
pub use decider::{parse_decision, SearchDecider};
pub use error::ChatError;
pub use gateway::SearchGateway;
pub use orchestrator::{AnswerEvent, AnswerStream, ChatOrchestrator, ChatReply};
