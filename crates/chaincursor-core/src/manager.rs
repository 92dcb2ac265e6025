//! Cursor manager — reads and advances the checkpoint for a pipeline key.
//!
//! Every call is a fresh read(-modify-write) against the store. Nothing is
//! cached between calls, so writes made by other processes are always seen.
//! The write is issued only after the new checkpoint is fully built; a call
//! that is dropped or times out before that point leaves the store untouched.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CursorConfig;
use crate::error::CursorError;
use crate::irreversible::{lib_number, BlockResolver};
use crate::store::CursorStore;
use crate::types::{BlockRef, Checkpoint};

/// Loads and advances cursors through a [`CursorStore`].
pub struct CursorManager<S: CursorStore> {
    store: S,
    config: CursorConfig,
    resolver: Option<Arc<dyn BlockResolver>>,
}

impl<S: CursorStore> CursorManager<S> {
    /// Manager with the default configuration (depth 32, no timeout, LIB id carried over).
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: CursorConfig::default(),
            resolver: None,
        }
    }

    pub fn builder(store: S) -> CursorManagerBuilder<S> {
        CursorManagerBuilder::new(store)
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the stored checkpoint for `key`, unmodified.
    pub async fn load(&self, key: &str) -> Result<Checkpoint, CursorError> {
        check_key(key)?;
        let checkpoint = self.bounded(self.store.get(key)).await?;
        if !checkpoint.is_consistent() {
            warn!(
                key,
                head = checkpoint.head.number,
                lib = checkpoint.lib.number,
                "stored cursor has LIB ahead of head"
            );
        }
        debug!(
            key,
            head = checkpoint.head.number,
            lib = checkpoint.lib.number,
            "cursor loaded"
        );
        Ok(checkpoint)
    }

    /// Move the cursor for `key` to `new_head`.
    ///
    /// `head` and `block` become `new_head`; the LIB height is recomputed as
    /// `new_head.number - confirmation_depth`. The step is kept as stored.
    /// A key that was never written is an error, not an implicit create.
    pub async fn advance(
        &self,
        key: &str,
        new_head: BlockRef,
    ) -> Result<Checkpoint, CursorError> {
        check_key(key)?;
        let lib_num = lib_number(new_head.number, self.config.confirmation_depth)?;

        let current = self.bounded(self.store.get(key)).await?;
        let lib_id = self.lib_id(&current, lib_num).await?;

        let next = Checkpoint {
            step: current.step,
            head: new_head.clone(),
            lib: BlockRef::new(lib_id, lib_num),
            block: new_head,
        };

        self.bounded(self.store.put(key, &next)).await?;

        info!(
            key,
            head = next.head.number,
            head_id = %next.head.id,
            lib = next.lib.number,
            "cursor advanced"
        );
        Ok(next)
    }

    /// Caller-facing form of [`advance`](Self::advance) taking the raw head fields.
    pub async fn advance_to(
        &self,
        key: &str,
        number: u64,
        id: impl Into<String>,
    ) -> Result<Checkpoint, CursorError> {
        self.advance(key, BlockRef::new(id, number)).await
    }

    async fn lib_id(&self, current: &Checkpoint, lib_num: u64) -> Result<String, CursorError> {
        let Some(resolver) = &self.resolver else {
            return Ok(current.lib.id.clone());
        };
        match self.bounded(resolver.block_id_at(lib_num)).await? {
            Some(id) => Ok(id),
            None => {
                warn!(
                    lib = lib_num,
                    previous = %current.lib.id,
                    "no canonical block at LIB height, keeping previous LIB id"
                );
                Ok(current.lib.id.clone())
            }
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CursorError>
    where
        F: Future<Output = Result<T, CursorError>>,
    {
        match self.config.store_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                CursorError::StoreUnavailable(format!("store call timed out after {limit:?}"))
            })?,
            None => fut.await,
        }
    }
}

fn check_key(key: &str) -> Result<(), CursorError> {
    if key.trim().is_empty() {
        return Err(CursorError::InvalidKey("key is empty".into()));
    }
    Ok(())
}

// ─── Builder ──────────────────────────────────────────────────────────────────

/// Fluent builder for [`CursorManager`].
pub struct CursorManagerBuilder<S: CursorStore> {
    store: S,
    config: CursorConfig,
    resolver: Option<Arc<dyn BlockResolver>>,
}

impl<S: CursorStore> CursorManagerBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: CursorConfig::default(),
            resolver: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CursorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of blocks between head and LIB.
    pub fn confirmation_depth(mut self, depth: u64) -> Self {
        self.config.confirmation_depth = depth;
        self
    }

    /// Bound every store call to `ms` milliseconds.
    pub fn store_timeout_ms(mut self, ms: u64) -> Self {
        self.config.store_timeout_ms = Some(ms);
        self
    }

    /// Resolve the LIB identifier through `resolver` instead of carrying it over.
    pub fn lib_resolver(mut self, resolver: Arc<dyn BlockResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<CursorManager<S>, CursorError> {
        self.config.validate()?;
        Ok(CursorManager {
            store: self.store,
            config: self.config,
            resolver: self.resolver,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
