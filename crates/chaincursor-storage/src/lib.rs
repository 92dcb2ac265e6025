//! chaincursor-storage — pluggable cursor storage backends.
//!
//! Backends:
//! - [`memory`] — in-memory (dry runs / tests, no persistence)
//! - [`dir`] — one JSON file per key in a directory
//! - `sqlite` — SQLite via `sqlx` (feature `sqlite`)
//! - `mongo` — MongoDB (feature `mongo`)
//!
//! [`open`] picks a backend from a store URL.

pub mod dir;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mongo")]
pub mod mongo;

pub use dir::DirStorage;
pub use memory::InMemoryStorage;

use chaincursor_core::error::CursorError;
use chaincursor_core::store::CursorStore;

/// Backend selected by a store URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    Memory,
    Dir(String),
    Sqlite(String),
    Mongo(String),
}

impl StoreUrl {
    /// Parse `memory:`, `file:<dir>`, `sqlite:<path>` or `mongodb[+srv]://…`.
    pub fn parse(url: &str) -> Result<Self, CursorError> {
        let url = url.trim();
        if url == "memory" || url == "memory:" {
            Ok(Self::Memory)
        } else if let Some(dir) = url.strip_prefix("file:") {
            let dir = dir.trim_start_matches("//");
            if dir.is_empty() {
                return Err(CursorError::InvalidConfig("file: store needs a directory".into()));
            }
            Ok(Self::Dir(dir.to_string()))
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite(url.to_string()))
        } else if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
            Ok(Self::Mongo(url.to_string()))
        } else {
            Err(CursorError::InvalidConfig(format!(
                "unsupported store url '{url}' (expected memory:, file:, sqlite: or mongodb://)"
            )))
        }
    }
}

/// Backends compiled into this build.
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = vec!["memory", "file"];
    if cfg!(feature = "sqlite") {
        backends.push("sqlite");
    }
    if cfg!(feature = "mongo") {
        backends.push("mongodb");
    }
    backends
}

/// Connect to the backend named by `url`.
pub async fn open(url: &str) -> Result<Box<dyn CursorStore>, CursorError> {
    match StoreUrl::parse(url)? {
        StoreUrl::Memory => Ok(Box::new(InMemoryStorage::new())),
        StoreUrl::Dir(path) => Ok(Box::new(DirStorage::open(path).await?)),
        #[cfg(feature = "sqlite")]
        StoreUrl::Sqlite(url) => Ok(Box::new(sqlite::SqliteStorage::open(&url).await?)),
        #[cfg(feature = "mongo")]
        StoreUrl::Mongo(url) => Ok(Box::new(mongo::MongoStorage::connect(&url, None).await?)),
        #[allow(unreachable_patterns)]
        other => Err(CursorError::InvalidConfig(format!(
            "{other:?} backend not compiled in (enable the matching feature)"
        ))),
    }
}
