//! SQLite ledger implementation

use async_trait::async_trait;
use feed_relay_domain::{Ledger, LedgerError, PublishRecord};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;

/// SQLite-backed delivery ledger.
///
/// Uses the `posts(id, feedspora_id, client_id)` table so ledgers written by
/// earlier feed republishers keep working.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open the ledger, creating the database and table if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        // Writes are sequential
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;

        Ok(ledger)
    }

    /// Create an in-memory ledger (for testing)
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;

        Ok(ledger)
    }

    async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                feedspora_id TEXT,
                client_id TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        // Create index for lookups
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS posts_idx
            ON posts(feedspora_id, client_id)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn is_published(&self, entry_id: &str, destination: &str) -> Result<bool, LedgerError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts WHERE feedspora_id = ? AND client_id = ?",
        )
        .bind(entry_id)
        .bind(destination)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn record_published(&self, record: &PublishRecord) -> Result<(), LedgerError> {
        sqlx::query("INSERT INTO posts (feedspora_id, client_id) VALUES (?, ?)")
            .bind(&record.entry_id)
            .bind(&record.destination)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    async fn counts_by_destination(&self) -> Result<Vec<(String, u64)>, LedgerError> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            "SELECT client_id, COUNT(*) FROM posts GROUP BY client_id ORDER BY client_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(client, count)| (client.unwrap_or_default(), count.max(0) as u64))
            .collect())
    }
}
