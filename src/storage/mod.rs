//! Per-user JSON document persistence.
//!
//! Each logical collection (analytics, vocabulary) is a table holding one
//! JSON document per user, replaced wholesale on every mutation. The
//! [`DocumentStore`] trait is the seam between the stateful components and
//! the storage engine; the default engine is `SQLite`, with an in-memory
//! implementation for tests and ephemeral runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio_rusqlite::Connection;

use crate::ids::UserId;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Document (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Whole-document persistence for one collection.
///
/// `save` replaces the user's document atomically; concurrent saves for
/// different users never block each other at this layer.
pub trait DocumentStore: Send + Sync {
    /// Load a user's document, if one has been saved.
    fn load(&self, user: UserId) -> StoreFuture<'_, StoreResult<Option<String>>>;

    /// Save (insert or replace) a user's document.
    fn save(&self, user: UserId, doc: String) -> StoreFuture<'_, StoreResult<()>>;
}

/// `SQLite` implementation of the document store.
///
/// The connection is shared across collections; each store owns one table.
pub struct SqliteDocumentStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteDocumentStore {
    /// Initialize the store and create its table if needed.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>, table: &str) -> StoreResult<Self> {
        let table = table.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    user_id TEXT PRIMARY KEY,
                    doc_json TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn load(&self, user: UserId) -> StoreFuture<'_, StoreResult<Option<String>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let user_key = user.to_string();

            let doc = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn
                        .prepare(&format!("SELECT doc_json FROM {table} WHERE user_id = ?1"))?;
                    let doc: Option<String> = stmt
                        .query_row(rusqlite::params![user_key], |row| row.get(0))
                        .ok();
                    Ok(doc)
                })
                .await?;

            Ok(doc)
        })
    }

    fn save(&self, user: UserId, doc: String) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let user_key = user.to_string();
            let updated_at = chrono::Utc::now().timestamp_millis();

            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {table} (user_id, doc_json, updated_at)
                             VALUES (?1, ?2, ?3)"
                        ),
                        rusqlite::params![user_key, doc, updated_at],
                    )?;
                    Ok(())
                })
                .await?;

            Ok(())
        })
    }
}

/// In-memory implementation of the document store.
///
/// Backed by a concurrent map; useful in tests and for ephemeral runs
/// where durability is not required.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: DashMap<UserId, String>,
}

impl MemoryDocumentStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, user: UserId) -> StoreFuture<'_, StoreResult<Option<String>>> {
        Box::pin(async move { Ok(self.docs.get(&user).map(|doc| doc.clone())) })
    }

    fn save(&self, user: UserId, doc: String) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.docs.insert(user, doc);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryDocumentStore::new();
        let user = UserId::new(1);

        assert!(store.load(user).await.unwrap().is_none());

        store.save(user, "{\"a\":1}".to_string()).await.unwrap();
        assert_eq!(store.load(user).await.unwrap().unwrap(), "{\"a\":1}");

        store.save(user, "{\"a\":2}".to_string()).await.unwrap();
        assert_eq!(store.load(user).await.unwrap().unwrap(), "{\"a\":2}");
    }

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let path = std::env::temp_dir().join(format!("coach_store_{}.sqlite", uuid::Uuid::new_v4()));
        let conn = Arc::new(Connection::open(&path).await.unwrap());

        let store = SqliteDocumentStore::new(Arc::clone(&conn), "test_docs")
            .await
            .unwrap();
        let user = UserId::new(7);

        assert!(store.load(user).await.unwrap().is_none());
        store.save(user, "{\"words\":[]}".to_string()).await.unwrap();
        assert_eq!(store.load(user).await.unwrap().unwrap(), "{\"words\":[]}");

        // Documents are replaced wholesale.
        store.save(user, "{\"words\":[1]}".to_string()).await.unwrap();
        assert_eq!(store.load(user).await.unwrap().unwrap(), "{\"words\":[1]}");

        let _ = std::fs::remove_file(&path);
    }
}
