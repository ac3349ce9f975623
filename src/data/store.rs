//! Durable key-value storage for editor state
//!
//! Values are JSON blobs. The SQLite-backed store is the normal path; the
//! in-memory store stands in when the database cannot be opened so the editor
//! still starts, just without durability.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::app_state::AppStateStore;
use super::database::{Database, DatabaseError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Async key-value store over a single logical table
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// SQLite-backed store running each call on the blocking pool
#[derive(Clone)]
pub struct SqliteStore {
    app_state: AppStateStore,
}

impl SqliteStore {
    pub fn new(database: &Database) -> Self {
        Self {
            app_state: AppStateStore::new(database.connection()),
        }
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let app_state = self.app_state.clone();
        let key = key.to_string();
        let raw = tokio::task::spawn_blocking(move || app_state.get(&key)).await??;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let app_state = self.app_state.clone();
        let key = key.to_string();
        let text = serde_json::to_string(value)?;
        tokio::task::spawn_blocking(move || app_state.set(&key, &text)).await??;
        Ok(())
    }
}

/// Ephemeral store used when no database is available
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Open the SQLite store at `path`, falling back to memory on failure
pub fn open_store(path: PathBuf) -> Arc<dyn DurableStore> {
    match Database::open(path.clone()) {
        Ok(database) => Arc::new(SqliteStore::new(&database)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Durable store unavailable; history will not survive this session"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
