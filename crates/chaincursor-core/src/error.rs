//! Error types for cursor loading and advancement.

use thiserror::Error;

/// Errors surfaced by the cursor manager and store adapters.
///
/// Nothing in this crate retries; every variant is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("no cursor stored for key '{key}'")]
    CursorNotFound { key: String },

    #[error("block height {number} is below the confirmation depth of {depth}")]
    InvalidBlockHeight { number: u64, depth: u64 },

    #[error("cursor store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid pipeline key: {0}")]
    InvalidKey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cursor serialization failed: {0}")]
    Serialization(String),
}

impl CursorError {
    /// Returns `true` if retrying the same call may succeed (backend failures only).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Returns `true` if the error means the key has never been written.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CursorNotFound { .. })
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::CursorNotFound { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_errors_are_retryable() {
        assert!(CursorError::StoreUnavailable("connection reset".into()).is_retryable());
        assert!(!CursorError::not_found("deadbeef").is_retryable());
        assert!(!CursorError::InvalidBlockHeight { number: 3, depth: 32 }.is_retryable());
    }

    #[test]
    fn display_includes_context() {
        let err = CursorError::InvalidBlockHeight { number: 31, depth: 32 };
        assert_eq!(
            err.to_string(),
            "block height 31 is below the confirmation depth of 32"
        );
        assert!(CursorError::not_found("deadbeef").to_string().contains("deadbeef"));
    }
}
