//! showtalk storage crate - SQLite episode catalog.
//!
//! Provides a WAL-mode SQLite database with migrations and the episode
//! repository used by the chat flow for title substring search.

pub mod db;
pub mod episodes;
pub mod migrations;

pub use db::Database;
pub use episodes::{CatalogImport, EpisodeRepository, EpisodeStore, ImportedEpisode, ImportedReview};
