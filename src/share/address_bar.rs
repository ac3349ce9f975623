//! Address-bar abstraction for the shared-link channel

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::data::{DurableStore, StoreError};

/// Where the current share query lives (a browser address bar, a file, ...)
#[async_trait]
pub trait AddressBar: Send + Sync {
    async fn query(&self) -> Result<String, StoreError>;
    async fn replace_query(&self, query: &str) -> Result<(), StoreError>;
}

/// In-process address bar, mostly for tests and previews
#[derive(Clone, Default)]
pub struct MemoryAddressBar {
    query: Arc<Mutex<String>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryAddressBar {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            query: Arc::new(Mutex::new(initial.into())),
            writes: Arc::default(),
        }
    }

    /// Number of `replace_query` calls so far
    pub fn writes(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

#[async_trait]
impl AddressBar for MemoryAddressBar {
    async fn query(&self) -> Result<String, StoreError> {
        let query = self.query.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(query.clone())
    }

    async fn replace_query(&self, query: &str) -> Result<(), StoreError> {
        *self.query.lock().map_err(|_| StoreError::LockPoisoned)? = query.to_string();
        *self.writes.lock().map_err(|_| StoreError::LockPoisoned)? += 1;
        Ok(())
    }
}

/// Address bar persisted as a string under one key of a durable store
pub struct StoreAddressBar {
    store: Arc<dyn DurableStore>,
    key: String,
}

impl StoreAddressBar {
    pub fn new(store: Arc<dyn DurableStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl AddressBar for StoreAddressBar {
    async fn query(&self) -> Result<String, StoreError> {
        Ok(match self.store.get(&self.key).await? {
            Some(Value::String(query)) => query,
            _ => String::new(),
        })
    }

    async fn replace_query(&self, query: &str) -> Result<(), StoreError> {
        self.store
            .set(&self.key, &Value::String(query.to_string()))
            .await
    }
}
