//! Application state shared across all route handlers.
//!
//! AppState holds the configuration and the chat orchestrator. It is
//! passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use showtalk_chat::ChatOrchestrator;
use showtalk_core::config::ShowtalkConfig;
use showtalk_llm::LlmProvider;
use showtalk_storage::EpisodeStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing
/// here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ShowtalkConfig>,
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ShowtalkConfig, orchestrator: ChatOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }

    /// Build the orchestrator from config and the injected collaborators.
    pub fn from_parts(
        config: ShowtalkConfig,
        store: Arc<dyn EpisodeStore>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let orchestrator = ChatOrchestrator::from_config(&config, store, llm);
        Self::new(config, orchestrator)
    }
}
