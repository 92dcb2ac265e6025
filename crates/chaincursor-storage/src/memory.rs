//! In-memory storage backend.
//!
//! Keeps cursors in RAM. Useful for dry runs and tests; everything is lost
//! when the process exits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use chaincursor_core::error::CursorError;
use chaincursor_core::store::CursorStore;
use chaincursor_core::types::Checkpoint;

/// In-memory cursor storage.
#[derive(Default)]
pub struct InMemoryStorage {
    cursors: Mutex<HashMap<String, Checkpoint>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cursors.
    pub fn len(&self) -> usize {
        self.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Checkpoint>>, CursorError> {
        self.cursors
            .lock()
            .map_err(|e| CursorError::StoreUnavailable(e.to_string()))
    }
}

#[async_trait]
impl CursorStore for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        self.lock()?
            .get(key)
            .cloned()
            .ok_or_else(|| CursorError::not_found(key))
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        self.lock()?.insert(key.to_string(), checkpoint.clone());
        debug!(key, head = checkpoint.head.number, "cursor stored in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincursor_core::types::BlockRef;

    fn cp(head: u64) -> Checkpoint {
        Checkpoint {
            head: BlockRef::new(format!("0x{head:x}"), head),
            lib: BlockRef::new("0xlib", head - 32),
            block: BlockRef::new(format!("0x{head:x}"), head),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn put_replaces_whole_record() {
        let store = InMemoryStorage::new();
        store.put("aa", &cp(100)).await.unwrap();
        store.put("aa", &cp(200)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("aa").await.unwrap(), cp(200));
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let store = InMemoryStorage::new();
        store.put("aa", &cp(100)).await.unwrap();

        assert!(store.get("bb").await.unwrap_err().is_not_found());
        assert_eq!(store.get("aa").await.unwrap().head.number, 100);
    }
}
