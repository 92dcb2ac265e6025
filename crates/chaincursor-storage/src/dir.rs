//! Persist cursors as JSON files in a directory.
//!
//! Each key maps to `<dir>/<key>.cursor`. Every write goes to its own
//! uniquely named temporary file in the same directory, is synced, and is
//! then renamed over the target, so readers see either the old record or
//! the new one and concurrent writers never share a temp file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use chaincursor_core::error::CursorError;
use chaincursor_core::store::CursorStore;
use chaincursor_core::types::Checkpoint;

/// Directory-backed cursor storage.
#[derive(Debug, Clone)]
pub struct DirStorage {
    path: PathBuf,
}

impl DirStorage {
    /// Use (and create if needed) the directory at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CursorError> {
        let path = path.as_ref();
        fs::create_dir_all(path).await.map_err(|e| {
            CursorError::StoreUnavailable(format!("failed to create directory {path:?}: {e}"))
        })?;
        info!(path = %path.display(), "using directory cursor storage");
        Ok(Self { path: path.into() })
    }

    pub fn cursor_file_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.cursor"))
    }

    fn check_key(key: &str) -> Result<(), CursorError> {
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(CursorError::InvalidKey(format!(
                "'{key}' cannot be used as a file name"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CursorStore for DirStorage {
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        Self::check_key(key)?;
        let path = self.cursor_file_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CursorError::not_found(key))
            }
            Err(e) => {
                return Err(CursorError::StoreUnavailable(format!(
                    "failed to read cursor file {path:?}: {e}"
                )))
            }
        };
        serde_json::from_str(&content).map_err(|e| CursorError::Serialization(e.to_string()))
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        Self::check_key(key)?;
        let serialized = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| CursorError::Serialization(e.to_string()))?;

        let dir = self.path.clone();
        let path = self.cursor_file_path(key);
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &serialized))
            .await
            .map_err(|e| CursorError::StoreUnavailable(format!("cursor write task failed: {e}")))??;

        debug!(key, head = checkpoint.head.number, "cursor written to disk");
        Ok(())
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), CursorError> {
    let io_err = |what: &str, e: std::io::Error| {
        CursorError::StoreUnavailable(format!("failed to {what} cursor file {path:?}: {e}"))
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err("create temp for", e))?;
    tmp.write_all(bytes).map_err(|e| io_err("write", e))?;
    tmp.as_file().sync_all().map_err(|e| io_err("sync", e))?;
    tmp.persist(path).map_err(|e| io_err("replace", e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincursor_core::types::{BlockRef, Step};

    fn sample() -> Checkpoint {
        Checkpoint {
            step: Step::NewIrreversible,
            head: BlockRef::new("B", 200),
            lib: BlockRef::new("A", 168),
            block: BlockRef::new("B", 200),
        }
    }

    #[tokio::test]
    async fn get_put_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStorage::open(dir.path()).await.unwrap();

        assert!(store.get("deadbeef").await.unwrap_err().is_not_found());

        store.put("deadbeef", &sample()).await.unwrap();
        assert_eq!(store.get("deadbeef").await.unwrap(), sample());
        assert!(store.cursor_file_path("deadbeef").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_on_one_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStorage::open(dir.path()).await.unwrap();
        store.put("deadbeef", &sample()).await.unwrap();

        let mut tasks = Vec::new();
        for n in 0..32u64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let mut cp = sample();
                cp.head = BlockRef::new(format!("H{n}"), 200 + n);
                store.put("deadbeef", &cp).await?;
                store.get("deadbeef").await.map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let last = store.get("deadbeef").await.unwrap();
        assert!(last.head.number >= 200);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn open_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        DirStorage::open(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStorage::open(dir.path()).await.unwrap();
        std::fs::write(store.cursor_file_path("abc"), "not json").unwrap();

        let err = store.get("abc").await.unwrap_err();
        assert!(matches!(err, CursorError::Serialization(_)));
    }

    #[tokio::test]
    async fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStorage::open(dir.path()).await.unwrap();
        let err = store.put("../escape", &sample()).await.unwrap_err();
        assert!(matches!(err, CursorError::InvalidKey(_)));
    }
}
