//! Message persistence.
//!
//! Storing parsed messages is optional and best effort: a failing store
//! is logged and never changes what the caller gets back. See
//! [`persist_best_effort`].

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::Message;
use crate::error::{AnalyzerError, Result};

/// A sink for parsed messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Stores `messages` and returns how many were written.
    async fn save_messages(&self, messages: &[Message]) -> Result<usize>;
}

/// Saves `messages` if a store is configured, logging and swallowing any
/// failure.
///
/// Returns the number of stored messages, or `None` when there is no
/// store or it failed.
pub async fn persist_best_effort(
    store: Option<&dyn MessageStore>,
    messages: &[Message],
) -> Option<usize> {
    let store = store?;
    match store.save_messages(messages).await {
        Ok(stored) => {
            debug!(stored, "messages persisted");
            Some(stored)
        }
        Err(err) => {
            warn!(error = %err, "failed to persist messages");
            None
        }
    }
}

/// Keeps messages in memory. Used when no database is configured but a
/// store is still wanted, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    messages: Mutex<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn save_messages(&self, messages: &[Message]) -> Result<usize> {
        let mut guard = self
            .messages
            .lock()
            .map_err(|_| AnalyzerError::Internal("message store lock poisoned".into()))?;
        guard.extend_from_slice(messages);
        Ok(messages.len())
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "sqlite")]
mod sqlite {
    use std::str::FromStr;

    use async_trait::async_trait;
    use sqlx::SqlitePool;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    use super::MessageStore;
    use crate::Message;
    use crate::error::{AnalyzerError, Result};

    /// SQLite-backed store with a single `messages` table.
    #[derive(Clone, Debug)]
    pub struct SqliteStore {
        pool: SqlitePool,
    }

    impl SqliteStore {
        /// Connects to `url` (e.g. `sqlite://chat.db`), creating the database
        /// file and schema if missing.
        pub async fn connect(url: &str) -> Result<Self> {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(|e| AnalyzerError::persistence("parsing database url", e))?
                .create_if_missing(true);

            let pool = SqlitePool::connect_with(options)
                .await
                .map_err(|e| AnalyzerError::persistence("connecting to database", e))?;

            let store = Self { pool };
            store.init().await?;
            Ok(store)
        }

        /// Opens a private in-memory database.
        pub async fn in_memory() -> Result<Self> {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| AnalyzerError::persistence("parsing database url", e))?;

            // Every connection to :memory: is its own database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await
                .map_err(|e| AnalyzerError::persistence("opening in-memory database", e))?;

            let store = Self { pool };
            store.init().await?;
            Ok(store)
        }

        async fn init(&self) -> Result<()> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    sender TEXT NOT NULL,
                    message TEXT NOT NULL,
                    timestamp DATETIME NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
                "#,
            )
            .execute(&self.pool)
            .await
            .map_err(|e| AnalyzerError::persistence("initializing schema", e))?;

            Ok(())
        }

        /// Number of stored messages.
        pub async fn count(&self) -> Result<i64> {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AnalyzerError::persistence("counting messages", e))
        }

        /// Stored messages in insertion order.
        pub async fn all(&self) -> Result<Vec<Message>> {
            let rows: Vec<(String, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
                "SELECT sender, message, timestamp FROM messages ORDER BY id ASC",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AnalyzerError::persistence("loading messages", e))?;

            Ok(rows
                .into_iter()
                .map(|(sender, message, timestamp)| Message::new(sender, message, timestamp))
                .collect())
        }
    }

    #[async_trait]
    impl MessageStore for SqliteStore {
        async fn save_messages(&self, messages: &[Message]) -> Result<usize> {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| AnalyzerError::persistence("starting transaction", e))?;

            for msg in messages {
                sqlx::query("INSERT INTO messages (sender, message, timestamp) VALUES (?, ?, ?)")
                    .bind(&msg.sender)
                    .bind(&msg.content)
                    .bind(msg.timestamp)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AnalyzerError::persistence("saving messages", e))?;
            }

            tx.commit()
                .await
                .map_err(|e| AnalyzerError::persistence("committing messages", e))?;

            Ok(messages.len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{TimeZone, Utc};

        #[tokio::test]
        async fn test_save_and_load() {
            let store = SqliteStore::in_memory().await.unwrap();
            let ts = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).unwrap();
            let messages = vec![
                Message::new("Alice", "Hello", ts),
                Message::new("Bob", "Hi: there", ts),
            ];

            assert_eq!(store.save_messages(&messages).await.unwrap(), 2);
            assert_eq!(store.count().await.unwrap(), 2);
            assert_eq!(store.all().await.unwrap(), messages);
        }

        #[tokio::test]
        async fn test_connect_creates_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("chat.db");
            let url = format!("sqlite://{}", path.display());
            let store = SqliteStore::connect(&url).await.unwrap();
            assert_eq!(store.count().await.unwrap(), 0);
            assert!(path.exists());
        }
    }
}
