//! Cursor data model: block references, pipeline steps, and the persisted checkpoint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CursorError;

// ─── BlockRef ─────────────────────────────────────────────────────────────────

/// Identifies a single block by hash and height.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRef {
    /// Opaque block identifier (hash / slot id).
    pub id: String,
    /// Block height.
    pub number: u64,
}

impl BlockRef {
    pub fn new(id: impl Into<String>, number: u64) -> Self {
        Self {
            id: id.into(),
            number,
        }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.number, self.id)
    }
}

// ─── Step ─────────────────────────────────────────────────────────────────────

/// Last applied pipeline step. Stored and returned as-is, never interpreted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    #[default]
    Unset,
    New,
    Undo,
    Irreversible,
    NewIrreversible,
    Stalled,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::New => write!(f, "new"),
            Self::Undo => write!(f, "undo"),
            Self::Irreversible => write!(f, "irreversible"),
            Self::NewIrreversible => write!(f, "new-irreversible"),
            Self::Stalled => write!(f, "stalled"),
        }
    }
}

impl FromStr for Step {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unset" => Ok(Self::Unset),
            "new" => Ok(Self::New),
            "undo" => Ok(Self::Undo),
            "irreversible" => Ok(Self::Irreversible),
            "new-irreversible" => Ok(Self::NewIrreversible),
            "stalled" => Ok(Self::Stalled),
            other => Err(CursorError::Serialization(format!("unknown step '{other}'"))),
        }
    }
}

// ─── Checkpoint ───────────────────────────────────────────────────────────────

/// The persisted processing position of one pipeline.
///
/// Stores hold at most one checkpoint per pipeline key and always replace the
/// whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last applied pipeline step.
    pub step: Step,
    /// Most recently processed block.
    pub head: BlockRef,
    /// Last block considered safe from reorganization.
    pub lib: BlockRef,
    /// Block of the last emitted state change.
    pub block: BlockRef,
}

impl Checkpoint {
    /// Returns `true` if the LIB does not run ahead of the head.
    pub fn is_consistent(&self) -> bool {
        self.head.number >= self.lib.number
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step={} block={} head={} lib={}",
            self.step, self.block, self.head, self.lib
        )
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
