//! Structural diffing, patch application, and diff merging.
//!
//! A [`Change`] addresses one location in a document by path and describes
//! an addition, update, or deletion there. [`diff`](diff::diff) produces an
//! ordered list of changes that [`apply_changes`](apply::apply_changes)
//! replays against a cloned document; [`merge`](merge::merge) reconciles
//! two diffs computed against the same base, pairing overlapping changes
//! into conflicts.

mod apply;
#[allow(clippy::module_inception)]
mod diff;
mod merge;

pub use apply::{apply_changes, ApplyError};
pub use diff::diff;
pub use merge::{merge, Conflict, MergeResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three structural change kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Update,
    Delete,
}

/// One structural change at a path.
///
/// `value` carries the added or updated value; for deletions it carries the
/// removed value, which merging and conflict display rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(rename = "changes")]
    pub value: Value,
}

impl Change {
    pub fn add(path: Vec<String>, value: Value) -> Self {
        Change {
            path,
            kind: ChangeKind::Add,
            value,
        }
    }

    pub fn update(path: Vec<String>, value: Value) -> Self {
        Change {
            path,
            kind: ChangeKind::Update,
            value,
        }
    }

    pub fn delete(path: Vec<String>, removed: Value) -> Self {
        Change {
            path,
            kind: ChangeKind::Delete,
            value: removed,
        }
    }
}
