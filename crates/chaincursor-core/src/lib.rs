//! chaincursor-core — durable processing cursor for block-streaming sinks.
//!
//! # Architecture
//!
//! ```text
//! KeyProvider ──► CursorManager ──► CursorStore (memory / dir / SQLite / MongoDB)
//!                      │
//!                      └── LIB policy (head - confirmation depth, optional BlockResolver)
//! ```
//!
//! A [`Checkpoint`] records the head, LIB and last emitted block of one
//! pipeline, keyed by the hex hash of its output module. The manager only
//! ever replaces whole checkpoints and never creates one implicitly.

pub mod config;
pub mod error;
pub mod irreversible;
pub mod key;
pub mod manager;
pub mod store;
pub mod types;

pub use config::CursorConfig;
pub use error::CursorError;
pub use irreversible::{lib_number, BlockResolver, CONFIRMATION_DEPTH};
pub use key::{KeyProvider, PipelineKey, StaticKey};
pub use manager::{CursorManager, CursorManagerBuilder};
pub use store::{CursorStore, MemoryCursorStore};
pub use types::{BlockRef, Checkpoint, Step};
