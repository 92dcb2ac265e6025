//! Checkpoint store contract — the only place cursor I/O happens.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::CursorError;
use crate::types::Checkpoint;

/// Persists one [`Checkpoint`] per pipeline key.
///
/// Implementations include `MemoryCursorStore` here and the directory, SQLite
/// and MongoDB backends in `chaincursor-storage`.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the checkpoint for `key`.
    ///
    /// Fails with [`CursorError::CursorNotFound`] when nothing is stored and
    /// [`CursorError::StoreUnavailable`] on backend errors.
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError>;

    /// Replace (upsert) the checkpoint for `key`. Must be atomic per key.
    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError>;
}

#[async_trait]
impl<S> CursorStore for Box<S>
where
    S: CursorStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        (**self).put(key, checkpoint).await
    }
}

#[async_trait]
impl<S> CursorStore for Arc<S>
where
    S: CursorStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        (**self).put(key, checkpoint).await
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

/// In-memory cursor store for tests and ephemeral pipelines.
///
/// Counts successful writes so tests can assert an operation did not write.
#[derive(Default)]
pub struct MemoryCursorStore {
    data: Mutex<HashMap<String, Checkpoint>>,
    writes: AtomicU64,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `key`, bypassing the write counter.
    pub fn seed(&self, key: impl Into<String>, checkpoint: Checkpoint) {
        self.lock().insert(key.into(), checkpoint);
    }

    /// Number of `put` calls that reached this store.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns `true` if a checkpoint exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Checkpoint>> {
        // A poisoned map is still a valid map; keep serving it.
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| CursorError::not_found(key))
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        self.lock().insert(key.to_string(), checkpoint.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockRef;

    fn sample() -> Checkpoint {
        Checkpoint {
            head: BlockRef::new("0xabc", 1_000),
            lib: BlockRef::new("0x123", 968),
            block: BlockRef::new("0xabc", 1_000),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryCursorStore::new();
        store.put("deadbeef", &sample()).await.unwrap();

        let loaded = store.get("deadbeef").await.unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn memory_store_missing_key() {
        let store = MemoryCursorStore::new();
        let err = store.get("deadbeef").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn seed_does_not_count_as_write() {
        let store = MemoryCursorStore::new();
        store.seed("k", sample());
        assert!(store.contains("k"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn boxed_store_delegates() {
        let store: Box<dyn CursorStore> = Box::new(MemoryCursorStore::new());
        store.put("k", &sample()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().head.number, 1_000);
    }
}
