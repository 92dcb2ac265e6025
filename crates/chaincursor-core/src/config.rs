//! Cursor manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CursorError;
use crate::irreversible::CONFIRMATION_DEPTH;

/// Configuration for a [`CursorManager`](crate::CursorManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Blocks between head and LIB. Defaults to [`CONFIRMATION_DEPTH`].
    #[serde(default = "default_confirmation_depth")]
    pub confirmation_depth: u64,
    /// Upper bound for a single store call, in milliseconds. `None` = wait forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_timeout_ms: Option<u64>,
}

fn default_confirmation_depth() -> u64 {
    CONFIRMATION_DEPTH
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            confirmation_depth: CONFIRMATION_DEPTH,
            store_timeout_ms: None,
        }
    }
}

impl CursorConfig {
    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), CursorError> {
        if self.store_timeout_ms == Some(0) {
            return Err(CursorError::InvalidConfig(
                "store_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CursorConfig::default();
        assert_eq!(cfg.confirmation_depth, 32);
        assert!(cfg.store_timeout().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: CursorConfig = serde_json::from_str("{\"store_timeout_ms\": 1500}").unwrap();
        assert_eq!(cfg.confirmation_depth, 32);
        assert_eq!(cfg.store_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = CursorConfig {
            store_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CursorError::InvalidConfig(_))));
    }
}
