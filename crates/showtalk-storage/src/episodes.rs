//! Episode catalog queries.
//!
//! Title substring search joined with review ratings, plus the JSON
//! import used to seed a fresh catalog.

use std::path::Path;
use std::sync::Arc;

use rusqlite::params;
use serde::Deserialize;
use tracing::{debug, info};

use showtalk_core::error::ShowtalkError;
use showtalk_core::types::EpisodeRecord;

use crate::db::Database;

/// Read access to the episode catalog.
///
/// Implementations must return an empty vec (not an error) when nothing
/// matches.
pub trait EpisodeStore: Send + Sync {
    /// Case-insensitive substring match against episode titles.
    fn find_episodes(&self, title_fragment: &str) -> Result<Vec<EpisodeRecord>, ShowtalkError>;

    /// Total number of rated episodes in the catalog.
    fn count(&self) -> Result<u64, ShowtalkError>;
}

/// Catalog document accepted by [`EpisodeRepository::import`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogImport {
    #[serde(default)]
    pub episodes: Vec<ImportedEpisode>,
    #[serde(default)]
    pub reviews: Vec<ImportedReview>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedEpisode {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub descr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedReview {
    pub id: i64,
    pub imdb_rating: f64,
}

/// SQLite-backed episode repository.
pub struct EpisodeRepository {
    db: Arc<Database>,
}

impl EpisodeRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert (or replace) an episode together with its rating.
    pub fn insert_episode(
        &self,
        id: i64,
        title: &str,
        descr: &str,
        imdb_rating: f64,
    ) -> Result<(), ShowtalkError> {
        self.db.with_transaction(|tx| {
            tx.execute(
                "INSERT OR REPLACE INTO episodes (id, title, descr) VALUES (?1, ?2, ?3)",
                params![id, title, descr],
            )
            .map_err(|e| ShowtalkError::Storage(format!("Failed to insert episode: {}", e)))?;
            tx.execute(
                "INSERT OR REPLACE INTO reviews (id, imdb_rating) VALUES (?1, ?2)",
                params![id, imdb_rating],
            )
            .map_err(|e| ShowtalkError::Storage(format!("Failed to insert review: {}", e)))?;
            Ok(())
        })
    }

    /// Load a parsed catalog document in a single transaction.
    ///
    /// Episodes are written before reviews so the foreign key holds.
    /// Returns the number of episodes written.
    pub fn import(&self, catalog: &CatalogImport) -> Result<usize, ShowtalkError> {
        let written = self.db.with_transaction(|tx| {
            for ep in &catalog.episodes {
                tx.execute(
                    "INSERT OR REPLACE INTO episodes (id, title, descr) VALUES (?1, ?2, ?3)",
                    params![ep.id, ep.title, ep.descr],
                )
                .map_err(|e| {
                    ShowtalkError::Storage(format!("Failed to import episode {}: {}", ep.id, e))
                })?;
            }
            for review in &catalog.reviews {
                tx.execute(
                    "INSERT OR REPLACE INTO reviews (id, imdb_rating) VALUES (?1, ?2)",
                    params![review.id, review.imdb_rating],
                )
                .map_err(|e| {
                    ShowtalkError::Storage(format!("Failed to import review {}: {}", review.id, e))
                })?;
            }
            Ok(catalog.episodes.len())
        })?;

        info!(
            episodes = written,
            reviews = catalog.reviews.len(),
            "Catalog imported"
        );
        Ok(written)
    }

    /// Read a JSON catalog file and import it.
    pub fn import_json(&self, path: &Path) -> Result<usize, ShowtalkError> {
        let content = std::fs::read_to_string(path)?;
        let catalog: CatalogImport = serde_json::from_str(&content)?;
        self.import(&catalog)
    }
}

impl EpisodeStore for EpisodeRepository {
    fn find_episodes(&self, title_fragment: &str) -> Result<Vec<EpisodeRecord>, ShowtalkError> {
        let pattern = format!("%{}%", escape_like(title_fragment));

        let records = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT e.title, e.descr, r.imdb_rating
                     FROM episodes e
                     JOIN reviews r ON r.id = e.id
                     WHERE e.title LIKE ?1 ESCAPE '\\'
                     ORDER BY e.id",
                )
                .map_err(|e| ShowtalkError::Storage(format!("Episode query prepare failed: {}", e)))?;

            let rows = stmt
                .query_map(params![pattern], |row| {
                    Ok(EpisodeRecord {
                        title: row.get(0)?,
                        description: row.get(1)?,
                        rating: row.get(2)?,
                    })
                })
                .map_err(|e| ShowtalkError::Storage(format!("Episode query failed: {}", e)))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| ShowtalkError::Storage(e.to_string()))
        })?;

        debug!(fragment = %title_fragment, matches = records.len(), "Episode title search");
        Ok(records)
    }

    fn count(&self) -> Result<u64, ShowtalkError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM episodes e JOIN reviews r ON r.id = e.id",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| ShowtalkError::Storage(e.to_string()))?;
            Ok(n as u64)
        })
    }
}

/// Escape LIKE wildcards so user text is matched literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
