//! MongoDB storage backend for ChainCursor.
//!
//! Cursors live in the `cursors` collection of the configured database, one
//! document per pipeline key (`_id` = key). Writes use `replace_one` with
//! upsert, which MongoDB applies atomically per document.
//!
//! # Feature Flag
//! Requires the `mongo` feature:
//! ```toml
//! chaincursor-storage = { version = "0.2", features = ["mongo"] }
//! ```

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ReplaceOptions};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use chaincursor_core::error::CursorError;
use chaincursor_core::store::CursorStore;
use chaincursor_core::types::{BlockRef, Checkpoint, Step};

/// Database used when the connection string does not pick one.
pub const DEFAULT_DATABASE: &str = "solana-m-substream";

/// Collection holding cursor documents.
pub const CURSOR_COLLECTION: &str = "cursors";

/// Stored shape of a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CursorDocument {
    #[serde(rename = "_id")]
    id: String,
    step: Step,
    head: BlockRef,
    lib: BlockRef,
    block: BlockRef,
    updated_at: i64,
}

impl CursorDocument {
    fn new(key: &str, checkpoint: &Checkpoint) -> Self {
        Self {
            id: key.to_string(),
            step: checkpoint.step,
            head: checkpoint.head.clone(),
            lib: checkpoint.lib.clone(),
            block: checkpoint.block.clone(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    fn into_checkpoint(self) -> Checkpoint {
        Checkpoint {
            step: self.step,
            head: self.head,
            lib: self.lib,
            block: self.block,
        }
    }
}

/// MongoDB-backed cursor storage.
#[derive(Clone)]
pub struct MongoStorage {
    collection: Collection<CursorDocument>,
}

impl MongoStorage {
    /// Connect to `connection_string` and use `database`
    /// (falls back to the database in the URL, then [`DEFAULT_DATABASE`]).
    pub async fn connect(
        connection_string: &str,
        database: Option<&str>,
    ) -> Result<Self, CursorError> {
        let options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| CursorError::InvalidConfig(format!("bad mongo connection string: {e}")))?;
        let db_name = database
            .map(str::to_string)
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(options).map_err(unavailable)?;
        let collection = client
            .database(&db_name)
            .collection::<CursorDocument>(CURSOR_COLLECTION);

        info!(database = %db_name, collection = CURSOR_COLLECTION, "using mongo cursor storage");
        Ok(Self { collection })
    }
}

fn unavailable(e: mongodb::error::Error) -> CursorError {
    CursorError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl CursorStore for MongoStorage {
    async fn get(&self, key: &str) -> Result<Checkpoint, CursorError> {
        let found = self
            .collection
            .find_one(doc! { "_id": key }, None)
            .await
            .map_err(unavailable)?;

        found
            .map(CursorDocument::into_checkpoint)
            .ok_or_else(|| CursorError::not_found(key))
    }

    async fn put(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CursorError> {
        let document = CursorDocument::new(key, checkpoint);
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(doc! { "_id": key }, &document, options)
            .await
            .map_err(unavailable)?;

        debug!(key, head = checkpoint.head.number, "cursor saved");
        Ok(())
    }
}
