//! OpenAPI workspace document store.
//!
//! A structured, diffable, mergeable in-memory representation of OpenAPI
//! documents:
//!
//! - [`diff`] — structural diff, ordered patch application, and merging of
//!   two diffs with conflict surfacing
//! - [`bundle`] — inlining external `$ref` targets into one
//!   self-contained document under a reserved namespace
//! - [`rebase`] — three-way reconciliation of local edits against an
//!   updated remote document
//! - [`watch`] — polling a document's remote source with exponential
//!   backoff and a conflict policy
//! - [`store`] — the workspace owning named documents and their metadata
//!
//! The crate is a library: no server, no CLI, no on-disk format. All
//! interchange is in-memory `serde_json::Value` trees; collaborators plug
//! in through the [`bundle::Loader`] and [`rebase::RemoteSource`] traits.

pub mod bundle;
pub mod diff;
pub mod extensions;
pub mod rebase;
pub mod store;
pub mod watch;

pub use bundle::{bundle, BundleConfig, BundleReport, BundleWarning, FileLoader, UrlLoader};
pub use diff::{apply_changes, diff, merge, ApplyError, Change, ChangeKind, Conflict, MergeResult};
pub use rebase::{
    fetch_and_rebase, rebase, ConflictPolicy, FetchError, Rebase, RebaseCommit, RebaseError,
    RemoteSource,
};
pub use store::{ExportFormat, StoreError, Workspace, WorkspaceDocument};
pub use watch::{DocumentWatcher, WatchConfig};
