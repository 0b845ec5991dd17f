//! Credential resolution for LLM clients.
//!
//! The API key is looked up when a request needs a client, not at
//! startup, so a missing key surfaces as a per-request error.

use std::sync::Arc;
use std::time::Duration;

use showtalk_core::config::LlmConfig;

use crate::client::{ChatOptions, LlmClient};
use crate::error::LlmError;
use crate::http::HttpLlmClient;

/// Hands out a ready-to-use client for one request.
pub trait LlmProvider: Send + Sync {
    /// Resolve credentials and build a client.
    fn client(&self) -> Result<Arc<dyn LlmClient>, LlmError>;

    /// Generation options applied to every call.
    fn options(&self) -> ChatOptions {
        ChatOptions::default()
    }
}

/// Reads the API key from the process environment on every call.
pub struct EnvLlmProvider {
    config: LlmConfig,
    http: reqwest::Client,
}

/// Connection deadline for every call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the pooled HTTP client shared by every request.
///
/// `timeout_secs` bounds each read, so a long answer keeps streaming as
/// long as tokens keep arriving. Non-streaming calls also get it as a
/// total deadline in [`HttpLlmClient`].
pub fn http_client(config: &LlmConfig) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

impl EnvLlmProvider {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = http_client(&config)?;
        Ok(Self { config, http })
    }

    /// Name of the environment variable holding the key.
    pub fn key_var(&self) -> &str {
        &self.config.api_key_env
    }

    fn api_key(&self) -> Result<String, LlmError> {
        match std::env::var(&self.config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(LlmError::MissingApiKey {
                var: self.config.api_key_env.clone(),
            }),
        }
    }
}

impl LlmProvider for EnvLlmProvider {
    fn client(&self) -> Result<Arc<dyn LlmClient>, LlmError> {
        let key = self.api_key()?;
        Ok(Arc::new(HttpLlmClient::with_http(
            self.http.clone(),
            &self.config,
            key,
        )))
    }

    fn options(&self) -> ChatOptions {
        ChatOptions::from(&self.config)
    }
}
