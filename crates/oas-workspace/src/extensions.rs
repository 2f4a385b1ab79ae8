//! Specification extension keys consumed and produced by the store.

/// Workspace meta: name of the currently active document.
pub const ACTIVE_DOCUMENT: &str = "x-scalar-active-document";

/// Workspace meta: UI theme identifier.
pub const THEME: &str = "x-scalar-theme";

/// Document meta: remote origin used for watching and rebasing.
pub const ORIGINAL_SOURCE_URL: &str = "x-scalar-original-source-url";

/// Document meta: whether the document watcher should poll the source.
pub const WATCH_MODE: &str = "x-scalar-watch-mode";

/// Reserved top-level section holding inlined external resources.
pub const EXT_NAMESPACE: &str = "x-ext";

/// Reserved top-level section mapping compressed keys back to their URLs.
pub const EXT_URLS: &str = "x-ext-urls";
