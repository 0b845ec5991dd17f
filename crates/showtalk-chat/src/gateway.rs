//! Keyword search over the episode catalog.

use std::sync::Arc;

use tracing::info;

use showtalk_core::types::EpisodeRecord;
use showtalk_storage::EpisodeStore;

use crate::error::ChatError;

/// Wraps the episode store, substituting a default for blank keywords.
#[derive(Clone)]
pub struct SearchGateway {
    store: Arc<dyn EpisodeStore>,
    default_keyword: String,
}

impl SearchGateway {
    pub fn new(store: Arc<dyn EpisodeStore>, default_keyword: impl Into<String>) -> Self {
        Self {
            store,
            default_keyword: default_keyword.into(),
        }
    }

    /// The keyword actually sent to storage.
    pub fn effective_keyword<'a>(&'a self, keyword: &'a str) -> &'a str {
        if keyword.trim().is_empty() {
            &self.default_keyword
        } else {
            keyword
        }
    }

    /// Blocking search. An empty result is not an error.
    pub fn search(&self, keyword: &str) -> Result<Vec<EpisodeRecord>, ChatError> {
        let keyword = self.effective_keyword(keyword);
        let records = self.store.find_episodes(keyword)?;
        info!(keyword = %keyword, results = records.len(), "Episode search");
        Ok(records)
    }

    /// Run [`search`](Self::search) on the blocking thread pool.
    pub async fn search_async(&self, keyword: &str) -> Result<Vec<EpisodeRecord>, ChatError> {
        let gateway = self.clone();
        let keyword = keyword.to_string();
        tokio::task::spawn_blocking(move || gateway.search(&keyword))
            .await
            .map_err(|e| ChatError::Storage(format!("search task failed: {}", e)))?
    }

    /// Number of searchable episodes.
    pub fn catalog_size(&self) -> Result<u64, ChatError> {
        Ok(self.store.count()?)
    }
}

impl std::fmt::Debug for SearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchGateway")
            .field("default_keyword", &self.default_keyword)
            .finish()
    }
}
