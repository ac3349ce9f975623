use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lumen::data::StoreError;
use lumen::scene::LightKind;
use lumen::{DurableStore, MemoryStore, PixelBuffer};
use serde_json::Value;

/// Durable store that counts successful `set` calls
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurableStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.inner.set(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Durable store whose every call fails, like a locked or missing database
pub struct BrokenStore;

#[async_trait]
impl DurableStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::LockPoisoned)
    }

    async fn set(&self, _key: &str, _value: &Value) -> Result<(), StoreError> {
        Err(StoreError::LockPoisoned)
    }
}

pub fn texture_light() -> LightKind {
    LightKind::Texture {
        color: "#ffeedd".into(),
        map: "softbox.png".into(),
    }
}

/// Float panorama whose rows run from dark (top) to bright (bottom)
pub fn gradient_panorama(width: u32, height: u32) -> PixelBuffer<f32> {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        let v = y as f32 / (height - 1).max(1) as f32 * 4.0;
        for _ in 0..width {
            data.extend_from_slice(&[v, v * 0.5, v * 0.25, 1.0]);
        }
    }
    PixelBuffer::new(width, height, 4, data).expect("valid panorama")
}
