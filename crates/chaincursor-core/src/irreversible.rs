//! Last-irreversible-block (LIB) policy.
//!
//! The LIB height is never supplied by callers. It is derived from the head
//! height minus a fixed confirmation depth. The LIB *identifier* cannot be
//! derived the same way, so by default it is carried over from the previous
//! checkpoint; a [`BlockResolver`] can be injected to look up the real one.

use async_trait::async_trait;

use crate::error::CursorError;

/// Number of blocks behind the head after which a block is treated as irreversible.
pub const CONFIRMATION_DEPTH: u64 = 32;

/// Compute the LIB height for `head`.
///
/// Heads below `depth` are rejected instead of flooring at zero.
pub fn lib_number(head: u64, depth: u64) -> Result<u64, CursorError> {
    head.checked_sub(depth)
        .ok_or(CursorError::InvalidBlockHeight { number: head, depth })
}

/// Looks up canonical block identifiers by height.
///
/// Used to refresh the LIB identifier when a chain source is available.
#[async_trait]
pub trait BlockResolver: Send + Sync {
    /// Identifier of the canonical block at `number`, or `None` if unknown.
    async fn block_id_at(&self, number: u64) -> Result<Option<String>, CursorError>;
}
