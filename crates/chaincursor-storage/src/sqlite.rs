//! SQLite storage backend for ChainCursor.
//!
//! Keeps one row per pipeline key in a single SQLite file. Uses `sqlx` with
//! WAL mode so readers are not blocked by the writer.
//!
//! # Usage
//! ```rust,no_run
//! use chaincursor_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./cursors.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use chaincursor_core::error::CursorError;
use chaincursor_core::store::CursorStore;
use chaincursor_core::types::{BlockRef, Checkpoint, Step};

/// SQLite-backed cursor storage.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./cursors.db"`) or a full
    /// SQLite URL (`"sqlite:./cursors.db"`). The file is created if missing
    /// in both forms.
    pub async fn open(path: &str) -> Result<Self, CursorError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}")
        };
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(unavailable)?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await.map_err(unavailable)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database. All data is lost when the pool is dropped.
    pub async fn in_memory() -> Result<Self, CursorError> {
        // A single connection, otherwise every pooled connection gets its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(unavailable)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), CursorError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cursors (
                module_hash TEXT    NOT NULL PRIMARY KEY,
                step        TEXT    NOT NULL,
                head_id     TEXT    NOT NULL,
                head_num    INTEGER NOT NULL,
                lib_id      TEXT    NOT NULL,
                lib_num     INTEGER NOT NULL,
                block_id    TEXT    NOT NULL,
                block_num   INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}

fn unavailable(e: sqlx::Error) -> CursorError {
    CursorError::StoreUnavailable(e.to_string())
}

fn block_ref(row: &SqliteRow, id_col: &str, num_col: &str) -> Result<BlockRef, CursorError> {
    let id: String = row.try_get(id_col).map_err(unavailable)?;
    let number: i64 = row.try_get(num_col).map_err(unavailable)?;
    let number = u64::try_from(number).map_err(|_| {
        CursorError::Serialization(format!("negative block number {number} in column {num_col}"))
    })?;
    Ok(BlockRef::new(id, number))
}

// ─── CursorStore impl ────────────────────────────────────────────────────────

#[async_trait]
impl CursorStore for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        let row = sqlx::query(
            "SELECT step, head_id, head_num, lib_id, lib_num, block_id, block_num
             FROM cursors WHERE module_hash = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| CursorError::not_found(key))?;

        let step: String = row.try_get("step").map_err(unavailable)?;
        Ok(Checkpoint {
            step: step.parse::<Step>()?,
            head: block_ref(&row, "head_id", "head_num")?,
            lib: block_ref(&row, "lib_id", "lib_num")?,
            block: block_ref(&row, "block_id", "block_num")?,
        })
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        sqlx::query(
            "INSERT OR REPLACE INTO cursors
             (module_hash, step, head_id, head_num, lib_id, lib_num, block_id, block_num, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(key)
        .bind(checkpoint.step.to_string())
        .bind(&checkpoint.head.id)
        .bind(checkpoint.head.number as i64)
        .bind(&checkpoint.lib.id)
        .bind(checkpoint.lib.number as i64)
        .bind(&checkpoint.block.id)
        .bind(checkpoint.block.number as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!(key, head = checkpoint.head.number, "cursor saved");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(head: u64, id: &str) -> Checkpoint {
        Checkpoint {
            step: Step::New,
            head: BlockRef::new(id, head),
            lib: BlockRef::new("0xlib", head - 32),
            block: BlockRef::new(id, head),
        }
    }

    #[tokio::test]
    async fn cursor_roundtrip() {
        let store = SqliteStorage::in_memory().await.unwrap();
        store.put("deadbeef", &sample(1_000, "0xabc")).await.unwrap();

        let loaded = store.get("deadbeef").await.unwrap();
        assert_eq!(loaded, sample(1_000, "0xabc"));
    }

    #[tokio::test]
    async fn cursor_upsert() {
        let store = SqliteStorage::in_memory().await.unwrap();
        store.put("deadbeef", &sample(100, "0xold")).await.unwrap();
        store.put("deadbeef", &sample(200, "0xnew")).await.unwrap();

        // Only one row; second put overwrites the first
        let loaded = store.get("deadbeef").await.unwrap();
        assert_eq!(loaded.head, BlockRef::new("0xnew", 200));

        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM cursors")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("cnt"), 1);
    }

    #[tokio::test]
    async fn cursor_missing_is_not_found() {
        let store = SqliteStorage::in_memory().await.unwrap();
        let err = store.get("cafebabe").await.unwrap_err();
        assert_eq!(err, CursorError::CursorNotFound { key: "cafebabe".into() });
    }

    #[tokio::test]
    async fn file_backed_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStorage::open(path).await.unwrap();
            store.put("aa", &sample(500, "0x5")).await.unwrap();
        }

        let store = SqliteStorage::open(path).await.unwrap();
        assert_eq!(store.get("aa").await.unwrap().head.number, 500);
    }

    #[tokio::test]
    async fn sqlite_url_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.db");
        let url = format!("sqlite:{}", path.display());

        let store = SqliteStorage::open(&url).await.unwrap();
        assert!(store.get("deadbeef").await.unwrap_err().is_not_found());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn malformed_row_is_an_error_not_a_panic() {
        let store = SqliteStorage::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO cursors
             (module_hash, step, head_id, head_num, lib_id, lib_num, block_id, block_num, updated_at)
             VALUES ('neg', 'new', 'B', -5, 'A', 1, 'B', 2, 0),
                    ('odd', 'sideways', 'B', 5, 'A', 1, 'B', 2, 0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.get("neg").await.unwrap_err();
        assert!(matches!(err, CursorError::Serialization(_)));

        let err = store.get("odd").await.unwrap_err();
        assert!(matches!(err, CursorError::Serialization(_)));
    }
}
