//! Database schema migrations.
//!
//! Applies the catalog schema: episodes, their reviews, and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use showtalk_core::error::ShowtalkError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ShowtalkError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ShowtalkError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ShowtalkError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: episode_catalog");
    }

    Ok(())
}

/// Version 1: episodes and reviews.
///
/// A review shares its id with the episode it rates.
fn apply_v1(conn: &Connection) -> Result<(), ShowtalkError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS episodes (
            id      INTEGER PRIMARY KEY NOT NULL,
            title   TEXT NOT NULL,
            descr   TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_episodes_title
            ON episodes (title COLLATE NOCASE);

        CREATE TABLE IF NOT EXISTS reviews (
            id          INTEGER PRIMARY KEY NOT NULL,
            imdb_rating REAL NOT NULL,
            FOREIGN KEY (id) REFERENCES episodes(id) ON DELETE CASCADE
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'episode_catalog');
        ",
    )
    .map_err(|e| ShowtalkError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_review_requires_episode() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        let err = conn.execute("INSERT INTO reviews (id, imdb_rating) VALUES (42, 7.5)", []);
        assert!(err.is_err());
    }
}
