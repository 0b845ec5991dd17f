//! LLM collaborator for showtalk.
//!
//! Defines the [`LlmClient`] and [`LlmProvider`] seams the chat flow talks
//! to, and an HTTP implementation for OpenAI-compatible chat completion
//! endpoints with SSE streaming.

pub mod client;
pub mod error;
pub mod http;
pub mod provider;

pub use client::{ChatOptions, ChunkStream, LlmClient};
pub use error::LlmError;
pub use http::HttpLlmClient;
pub use provider::{http_client, EnvLlmProvider, LlmProvider};
