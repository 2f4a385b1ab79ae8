//! The workspace: named documents plus workspace-level metadata.
//!
//! A workspace exclusively owns its documents. Each document carries two
//! layers: the current local `content` (mutated by direct edits and by
//! committed rebases) and the last-known-remote `snapshot` (the base every
//! rebase diffs against). Watchers reference documents by name only and
//! are owned elsewhere.

use indexmap::IndexMap;
use oas_json::deep_equal;
use oas_json::json_clone::clone;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::diff::{Change, Conflict};
use crate::extensions;
use crate::rebase::{
    parse_document_body, rebase, ConflictPolicy, RebaseCommit, RebaseError, RemoteSource,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document '{0}' does not exist in the workspace")]
    UnknownDocument(String),

    #[error("document '{0}' already exists in the workspace")]
    DuplicateDocument(String),

    #[error("cannot serialize document '{0}': {1}")]
    Serialize(String, String),

    #[error("cannot load document '{0}': {1}")]
    Load(String, String),
}

/// Serialization target for document export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

/// One document in the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    content: Value,
    snapshot: Value,
}

impl WorkspaceDocument {
    fn new(content: Value) -> Self {
        let snapshot = clone(&content);
        WorkspaceDocument { content, snapshot }
    }

    /// Current local document state.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Direct edit mutator. Edits accumulate until the next rebase diffs
    /// them against the snapshot.
    pub fn content_mut(&mut self) -> &mut Value {
        &mut self.content
    }

    /// Last-known-remote snapshot (the rebase base).
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// Remote origin recorded on the document, when present.
    pub fn source_url(&self) -> Option<String> {
        self.content
            .get(extensions::ORIGINAL_SOURCE_URL)
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// Whether the document watcher flag is enabled.
    pub fn watch_mode(&self) -> bool {
        self.content
            .get(extensions::WATCH_MODE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether local edits exist relative to the snapshot.
    pub fn is_dirty(&self) -> bool {
        !deep_equal(&self.content, &self.snapshot)
    }
}

/// The workspace store.
///
/// Serializable as a whole: persisting and restoring the workspace
/// round-trips every document exactly (extension fields included) —
/// the persistence layer itself lives outside this crate.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    meta: Map<String, Value>,
    #[serde(default)]
    documents: IndexMap<String, WorkspaceDocument>,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace::default()
    }

    // ── Document lifecycle ────────────────────────────────────────────

    /// Add an in-memory document. The snapshot starts equal to the
    /// content.
    pub fn add_document(&mut self, name: &str, content: Value) -> Result<(), StoreError> {
        if self.documents.contains_key(name) {
            return Err(StoreError::DuplicateDocument(name.to_string()));
        }
        self.documents
            .insert(name.to_string(), WorkspaceDocument::new(content));
        Ok(())
    }

    /// Fetch a document from a remote source and add it, recording the
    /// origin so the watcher can poll it later.
    pub async fn add_document_from_source(
        &mut self,
        name: &str,
        source: &dyn RemoteSource,
        url: &str,
    ) -> Result<(), StoreError> {
        if self.documents.contains_key(name) {
            return Err(StoreError::DuplicateDocument(name.to_string()));
        }
        let body = source
            .fetch(url)
            .await
            .map_err(|e| StoreError::Load(name.to_string(), e.0))?;
        let mut content = parse_document_body(&body)
            .map_err(|e| StoreError::Load(name.to_string(), e))?;
        if let Value::Object(map) = &mut content {
            map.insert(
                extensions::ORIGINAL_SOURCE_URL.to_string(),
                Value::String(url.to_string()),
            );
        }
        self.documents
            .insert(name.to_string(), WorkspaceDocument::new(content));
        Ok(())
    }

    /// Remove a document, returning it. Any watcher for it must be
    /// stopped by its owner; watchers observe the removal on their next
    /// state sync.
    pub fn remove_document(&mut self, name: &str) -> Option<WorkspaceDocument> {
        self.documents.shift_remove(name)
    }

    pub fn document(&self, name: &str) -> Option<&WorkspaceDocument> {
        self.documents.get(name)
    }

    pub fn document_mut(&mut self, name: &str) -> Option<&mut WorkspaceDocument> {
        self.documents.get_mut(name)
    }

    pub fn document_names(&self) -> Vec<&str> {
        self.documents.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    // ── Workspace & document metadata ─────────────────────────────────

    /// Read a workspace metadata field.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Set a workspace metadata field (`x-scalar-active-document`,
    /// `x-scalar-theme`, …).
    pub fn update_meta(&mut self, key: &str, value: Value) {
        self.meta.insert(key.to_string(), value);
    }

    /// The active document name: explicit metadata first, then the first
    /// document in insertion order.
    pub fn active_document_name(&self) -> Option<String> {
        if let Some(name) = self
            .meta
            .get(extensions::ACTIVE_DOCUMENT)
            .and_then(Value::as_str)
        {
            if self.documents.contains_key(name) {
                return Some(name.to_string());
            }
        }
        self.documents.keys().next().cloned()
    }

    pub fn active_document(&self) -> Option<&WorkspaceDocument> {
        self.active_document_name()
            .and_then(|name| self.documents.get(&name))
    }

    /// Set a document metadata field on the document root.
    pub fn update_document_meta(
        &mut self,
        name: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let doc = self
            .documents
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownDocument(name.to_string()))?;
        if let Value::Object(map) = &mut doc.content {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Toggle the watcher flag on a document.
    pub fn set_watch_mode(&mut self, name: &str, enabled: bool) -> Result<(), StoreError> {
        self.update_document_meta(name, extensions::WATCH_MODE, Value::Bool(enabled))
    }

    /// Record or replace the remote origin of a document.
    pub fn set_source_url(&mut self, name: &str, url: &str) -> Result<(), StoreError> {
        self.update_document_meta(
            name,
            extensions::ORIGINAL_SOURCE_URL,
            Value::String(url.to_string()),
        )
    }

    // ── Edits & export ────────────────────────────────────────────────

    /// Discard local edits: the content becomes the snapshot again.
    pub fn revert_document(&mut self, name: &str) -> Result<(), StoreError> {
        let doc = self
            .documents
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownDocument(name.to_string()))?;
        doc.content = clone(&doc.snapshot);
        Ok(())
    }

    /// Serialize the current content of a document.
    pub fn export_document(&self, name: &str, format: ExportFormat) -> Result<String, StoreError> {
        let doc = self
            .documents
            .get(name)
            .ok_or_else(|| StoreError::UnknownDocument(name.to_string()))?;
        match format {
            ExportFormat::Json => serde_json::to_string(&doc.content)
                .map_err(|e| StoreError::Serialize(name.to_string(), e.to_string())),
            ExportFormat::Yaml => serde_yaml_ng::to_string(&doc.content)
                .map_err(|e| StoreError::Serialize(name.to_string(), e.to_string())),
        }
    }

    // ── Rebase entry points ───────────────────────────────────────────

    /// Rebase a document onto a new remote version.
    ///
    /// When no conflicts exist the merged result commits immediately and
    /// an empty list returns. Otherwise nothing commits; the conflicts
    /// (remote changes first in each tuple) are returned for the caller
    /// to resolve and pass to [`Workspace::rebase_document_resolved`].
    pub fn rebase_document(
        &mut self,
        name: &str,
        remote: &Value,
    ) -> Result<Vec<Conflict>, RebaseError> {
        let doc = self
            .documents
            .get(name)
            .ok_or_else(|| RebaseError::UnknownDocument(name.to_string()))?;
        let rb = rebase(&doc.snapshot, &doc.content, remote)?;
        if rb.has_conflicts() {
            return Ok(rb.conflicts);
        }
        let commit = rb.apply(Vec::new())?;
        self.commit_rebase(name, commit)?;
        Ok(Vec::new())
    }

    /// Rebase with explicit per-conflict selections and commit.
    pub fn rebase_document_resolved(
        &mut self,
        name: &str,
        remote: &Value,
        selected: Vec<Change>,
    ) -> Result<(), RebaseError> {
        let doc = self
            .documents
            .get(name)
            .ok_or_else(|| RebaseError::UnknownDocument(name.to_string()))?;
        let commit = rebase(&doc.snapshot, &doc.content, remote)?.apply(selected)?;
        self.commit_rebase(name, commit)
    }

    /// Rebase with a fixed conflict policy and commit. The watcher path.
    pub fn rebase_document_with_policy(
        &mut self,
        name: &str,
        remote: &Value,
        policy: ConflictPolicy,
    ) -> Result<(), RebaseError> {
        let doc = self
            .documents
            .get(name)
            .ok_or_else(|| RebaseError::UnknownDocument(name.to_string()))?;
        let commit = rebase(&doc.snapshot, &doc.content, remote)?.resolve(policy)?;
        self.commit_rebase(name, commit)
    }

    /// Commit an applied rebase: new local content plus new snapshot.
    pub fn commit_rebase(&mut self, name: &str, commit: RebaseCommit) -> Result<(), RebaseError> {
        let doc = self
            .documents
            .get_mut(name)
            .ok_or_else(|| RebaseError::UnknownDocument(name.to_string()))?;
        doc.content = commit.content;
        doc.snapshot = commit.snapshot;
        Ok(())
    }
}
