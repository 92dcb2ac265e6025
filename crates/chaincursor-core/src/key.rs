//! Pipeline identity keys.
//!
//! A cursor belongs to one output-module configuration, identified by the
//! hex-encoded hash of that module. Resolving the hash from a package
//! manifest happens outside this crate; callers hand in a [`KeyProvider`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CursorError;

/// Lowercase hex identifier of a pipeline's output module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PipelineKey(String);

impl PipelineKey {
    /// Validate and normalise a hex key (case-insensitive input, lowercase output).
    pub fn parse(raw: &str) -> Result<Self, CursorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CursorError::InvalidKey("key is empty".into()));
        }
        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(CursorError::InvalidKey(format!(
                "'{trimmed}' contains non-hex character '{bad}'"
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Build a key from raw module hash bytes.
    pub fn from_hash(hash: &[u8]) -> Result<Self, CursorError> {
        if hash.is_empty() {
            return Err(CursorError::InvalidKey("module hash is empty".into()));
        }
        Ok(Self(hex::encode(hash)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PipelineKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PipelineKey {
    type Error = CursorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PipelineKey> for String {
    fn from(key: PipelineKey) -> Self {
        key.0
    }
}

/// Supplies the pipeline key a cursor operation runs against.
pub trait KeyProvider: Send + Sync {
    fn pipeline_key(&self) -> Result<PipelineKey, CursorError>;
}

/// A key known up front (e.g. passed on the command line).
#[derive(Debug, Clone)]
pub struct StaticKey(PipelineKey);

impl StaticKey {
    pub fn new(key: PipelineKey) -> Self {
        Self(key)
    }
}

impl KeyProvider for StaticKey {
    fn pipeline_key(&self) -> Result<PipelineKey, CursorError> {
        Ok(self.0.clone())
    }
}
