//! Rebase coordination: reconciling local edits with an updated remote
//! document.
//!
//! A rebase attempt serializes fetch -> no-change check -> dual diff ->
//! conflict surfacing -> apply. Nothing is committed until
//! [`Rebase::apply`] (or [`Rebase::resolve`]) succeeds; every failure
//! leaves the caller's stored state untouched.

use async_trait::async_trait;
use oas_json::json_clone::clone;
use oas_json::{deep_equal, pointer};
use serde_json::Value;
use thiserror::Error;

use crate::diff::{apply_changes, diff, merge, ApplyError, Change, ChangeKind, Conflict};

/// Source of remote document bodies, injectable and mockable.
///
/// Implementations fetch the raw body text; parsing (JSON, then YAML)
/// happens in the coordinator so fetch and parse failures stay distinct.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// A failed remote fetch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Typed rebase failures.
///
/// `NoChangesDetected` is the steady-state outcome: the remote body equals
/// the last-known snapshot, there is nothing to do, and callers (the
/// watcher in particular) treat it as success.
#[derive(Debug, Error)]
pub enum RebaseError {
    #[error("NO_CHANGES_DETECTED")]
    NoChangesDetected,

    #[error("FETCH_ERROR: {0}")]
    Fetch(String),

    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    #[error("unknown document '{0}'")]
    UnknownDocument(String),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Which side wins each conflict when resolving without user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Take the remote half of every conflict (the watcher default).
    #[default]
    PreferRemote,
    /// Keep the local half of every conflict.
    PreferLocal,
}

/// Parse a remote document body: JSON first, YAML as fallback.
pub fn parse_document_body(body: &str) -> Result<Value, String> {
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml_ng::from_str(body)
            .map_err(|yaml_err| format!("not JSON ({json_err}) nor YAML ({yaml_err})")),
    }
}

/// A computed, not-yet-committed rebase.
#[derive(Debug)]
pub struct Rebase {
    /// Overlapping change groups: remote-side changes first in each tuple.
    pub conflicts: Vec<Conflict>,
    auto: Vec<Change>,
    base: Value,
    remote: Value,
}

/// The outcome of a successfully applied rebase, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct RebaseCommit {
    /// Merged document: both sides' non-conflicting changes plus the
    /// selected conflict resolutions.
    pub content: Value,
    /// The fetched remote, which becomes the new last-known snapshot.
    pub snapshot: Value,
}

impl Rebase {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Apply the non-conflicting changes plus `selected` conflict
    /// resolutions and produce the commit. Consumes the rebase; an
    /// [`ApplyError`] abandons the whole attempt.
    ///
    /// Array deletes landing on the same parent from both sides are
    /// reordered to descending index before application, so splicing from
    /// the end never invalidates a later index.
    pub fn apply(self, selected: Vec<Change>) -> Result<RebaseCommit, ApplyError> {
        let mut combined = self.auto;
        combined.extend(selected);
        order_array_deletes(&mut combined);
        let content = apply_changes(&self.base, &combined)?;
        Ok(RebaseCommit {
            content,
            snapshot: self.remote,
        })
    }

    /// Apply with a fixed per-conflict policy instead of explicit picks.
    pub fn resolve(self, policy: ConflictPolicy) -> Result<RebaseCommit, ApplyError> {
        let selected = self
            .conflicts
            .iter()
            .flat_map(|(remote, local)| match policy {
                ConflictPolicy::PreferRemote => remote.clone(),
                ConflictPolicy::PreferLocal => local.clone(),
            })
            .collect();
        self.apply(selected)
    }
}

/// Compute a rebase of `local` against `remote`, both relative to the
/// common `base` (the last-known-remote snapshot).
///
/// Returns `Err(NoChangesDetected)` when the remote is structurally
/// identical to the base. Otherwise non-overlapping changes from both
/// sides are queued for automatic application and overlapping ones are
/// surfaced as conflicts, remote side first.
pub fn rebase(base: &Value, local: &Value, remote: &Value) -> Result<Rebase, RebaseError> {
    if deep_equal(remote, base) {
        return Err(RebaseError::NoChangesDetected);
    }
    let remote_diff = diff(base, remote);
    let local_diff = diff(base, local);
    let merged = merge(remote_diff, local_diff);
    Ok(Rebase {
        conflicts: merged.conflicts,
        auto: merged.changes,
        base: clone(base),
        remote: clone(remote),
    })
}

/// Reorder same-parent array deletes to descending index, in place.
///
/// Only the members of each group move, and only between their own
/// positions; the surrounding change order is untouched.
fn order_array_deletes(changes: &mut [Change]) {
    let mut handled = vec![false; changes.len()];
    for i in 0..changes.len() {
        if handled[i] || !is_array_delete(&changes[i]) {
            continue;
        }
        let parent = changes[i].path[..changes[i].path.len() - 1].to_vec();
        let mut positions = vec![i];
        for (j, other) in changes.iter().enumerate().skip(i + 1) {
            if !handled[j]
                && is_array_delete(other)
                && other.path[..other.path.len() - 1] == parent[..]
            {
                positions.push(j);
            }
        }
        if positions.len() > 1 {
            let mut members: Vec<Change> =
                positions.iter().map(|&p| changes[p].clone()).collect();
            members.sort_by_key(|c| {
                std::cmp::Reverse(c.path.last().and_then(|s| s.parse::<usize>().ok()))
            });
            for (&p, member) in positions.iter().zip(members) {
                changes[p] = member;
            }
        }
        for &p in &positions {
            handled[p] = true;
        }
    }
}

fn is_array_delete(change: &Change) -> bool {
    change.kind == ChangeKind::Delete
        && change
            .path
            .last()
            .is_some_and(|s| s.bytes().all(|b| b.is_ascii_digit()) && !s.is_empty())
}

/// One full coordinator pass: fetch, parse, rebase.
///
/// This is the async entry point the watcher drives; interactive callers
/// that already hold the remote value use [`rebase`] directly.
pub async fn fetch_and_rebase(
    source: &dyn RemoteSource,
    url: &str,
    base: &Value,
    local: &Value,
) -> Result<Rebase, RebaseError> {
    let body = source
        .fetch(url)
        .await
        .map_err(|e| RebaseError::Fetch(e.0))?;
    let remote = parse_document_body(&body).map_err(RebaseError::Parse)?;
    rebase(base, local, &remote)
}

/// Pretty-print a conflict group for logs and UIs.
pub fn describe_conflict(conflict: &Conflict) -> String {
    let describe_side = |changes: &[Change]| {
        changes
            .iter()
            .map(|c| format!("{:?} {}", c.kind, pointer::format_fragment(&c.path)))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "remote [{}] vs local [{}]",
        describe_side(&conflict.0),
        describe_side(&conflict.1)
    )
}
