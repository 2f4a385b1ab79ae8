//! Bundling: inlining external `$ref` targets into a self-contained
//! document.
//!
//! The bundler walks a document depth-first. Every external reference
//! (a URL or file path, as opposed to an internal `#/…` pointer) is
//! resolved through the configured [`Loader`]s, stored once under the
//! reserved `x-ext` section keyed by a compressed hash key, and the
//! reference site is rewritten to an internal pointer
//! (`#/x-ext/<key>/<remaining fragment>`). Fetched resources are bundled
//! recursively with their own origin, so relative references and mutually
//! circular resources resolve without refetching or infinite recursion.
//!
//! Loader failures never abort the pass: the affected reference is left
//! as-is and collected into the report's warning list.

mod file;
mod http;
mod keys;
mod loader;

pub use file::FileLoader;
pub use http::UrlLoader;
pub use keys::CompressedKeys;
pub use loader::{LoadError, Loader};

use std::collections::HashMap;

use indexmap::IndexMap;
use oas_json::pointer::{self, format_fragment, is_local_ref, is_remote_url, parse_fragment};
use serde_json::{Map, Value};

use crate::extensions::{EXT_NAMESPACE, EXT_URLS};

/// Bundler configuration for one pass.
pub struct BundleConfig {
    /// Loaders tried in order; the first whose `validate` accepts a
    /// target resolves it.
    pub loaders: Vec<Box<dyn Loader>>,
    /// Origin of the root document, used to resolve relative reference
    /// targets at the top level.
    pub origin: Option<String>,
}

impl BundleConfig {
    pub fn new(loaders: Vec<Box<dyn Loader>>) -> Self {
        BundleConfig {
            loaders,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// One reference the bundler could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleWarning {
    /// The absolute target that failed.
    pub reference: String,
    pub error: LoadError,
}

/// Outcome of a bundle pass.
#[derive(Debug, Default)]
pub struct BundleReport {
    /// Compressed key -> original URL for every inlined resource. Also
    /// written into the document under `x-ext-urls`.
    pub url_map: IndexMap<String, String>,
    /// Per-reference failures; empty when everything resolved.
    pub warnings: Vec<BundleWarning>,
}

/// Bundle `doc` in place.
pub async fn bundle(doc: &mut Value, config: &BundleConfig) -> BundleReport {
    let mut bundler = Bundler {
        config,
        keys: CompressedKeys::new(),
        failed: HashMap::new(),
        warnings: Vec::new(),
        url_map: IndexMap::new(),
    };
    bundler.run(doc).await;

    if !bundler.url_map.is_empty() {
        if let Value::Object(root) = doc {
            let mut url_section = Map::new();
            for (key, url) in &bundler.url_map {
                url_section.insert(key.clone(), Value::String(url.clone()));
            }
            root.insert(EXT_URLS.to_string(), Value::Object(url_section));
        }
    }

    BundleReport {
        url_map: bundler.url_map,
        warnings: bundler.warnings,
    }
}

// ── Reference helpers ─────────────────────────────────────────────────

/// Split an external target into its resource part and pointer fragment.
///
/// `"http://a/b#/x/y"` -> `("http://a/b", "/x/y")`, `"./c.json"` ->
/// `("./c.json", "")`.
pub fn split_ref(target: &str) -> (&str, &str) {
    match target.split_once('#') {
        Some((resource, fragment)) => (resource, fragment),
        None => (target, ""),
    }
}

/// Resolve a reference resource against the origin of the document that
/// contains it.
///
/// Absolute URLs pass through untouched. Relative targets join a remote
/// origin with URL semantics (`./`, `../`, `/rooted`) and a filesystem
/// origin with path semantics.
pub fn resolve_target(origin: Option<&str>, resource: &str) -> String {
    if is_remote_url(resource) {
        return resource.to_string();
    }
    match origin {
        Some(o) if is_remote_url(o) => match url::Url::parse(o).and_then(|base| base.join(resource))
        {
            Ok(joined) => joined.to_string(),
            Err(_) => resource.to_string(),
        },
        Some(o) => {
            let base = std::path::Path::new(o);
            let dir = base.parent().unwrap_or_else(|| std::path::Path::new(""));
            normalize_path(&dir.join(resource))
        }
        None => resource.to_string(),
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize_path(path: &std::path::Path) -> String {
    use std::path::Component;
    let mut parts: Vec<String> = Vec::new();
    let mut prefix = String::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    parts.push("..".to_string());
                }
            }
            Component::RootDir => prefix = "/".to_string(),
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::Prefix(p) => prefix = p.as_os_str().to_string_lossy().into_owned(),
        }
    }
    format!("{prefix}{}", parts.join("/"))
}

/// Prefix an internal fragment pointer with extra leading segments.
///
/// `prefix_internal_ref("#/a/b", ["x-ext", "k"])` -> `"#/x-ext/k/a/b"`.
/// Fails on non-internal targets.
pub fn prefix_internal_ref(target: &str, prefix: &[String]) -> Result<String, pointer::PointerError> {
    let path = parse_fragment(target)?;
    let mut combined = prefix.to_vec();
    combined.extend(path);
    Ok(format_fragment(&combined))
}

/// Recursively prefix every internal `$ref` in `value`.
///
/// External references are left untouched; they are rewritten separately
/// once their own resources resolve.
pub fn prefix_internal_ref_recursive(value: &mut Value, prefix: &[String]) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("$ref") {
                if is_local_ref(target) {
                    if let Ok(prefixed) = prefix_internal_ref(target, prefix) {
                        map.insert("$ref".to_string(), Value::String(prefixed));
                    }
                    return;
                }
            }
            for (_, child) in map.iter_mut() {
                prefix_internal_ref_recursive(child, prefix);
            }
        }
        Value::Array(arr) => {
            for child in arr.iter_mut() {
                prefix_internal_ref_recursive(child, prefix);
            }
        }
        _ => {}
    }
}

// ── The bundling pass ─────────────────────────────────────────────────

enum Action {
    Children(Vec<String>),
    External(String),
    Nothing,
}

struct Bundler<'a> {
    config: &'a BundleConfig,
    keys: CompressedKeys,
    failed: HashMap<String, LoadError>,
    warnings: Vec<BundleWarning>,
    url_map: IndexMap<String, String>,
}

impl Bundler<'_> {
    async fn run(&mut self, doc: &mut Value) {
        // Depth-first over (path, origin) pairs. Inlined resources are
        // pushed with their own origin so their relative refs resolve
        // against the right base.
        let mut stack: Vec<(Vec<String>, Option<String>)> =
            vec![(Vec::new(), self.config.origin.clone())];

        while let Some((path, origin)) = stack.pop() {
            let action = match pointer::get(doc, &path) {
                Some(Value::Object(map)) => match map.get("$ref") {
                    Some(Value::String(target)) if !is_local_ref(target) => {
                        Action::External(target.clone())
                    }
                    Some(_) => Action::Nothing,
                    None => Action::Children(map.keys().cloned().collect()),
                },
                Some(Value::Array(arr)) => {
                    Action::Children((0..arr.len()).map(|i| i.to_string()).collect())
                }
                _ => Action::Nothing,
            };

            match action {
                Action::Children(segments) => {
                    for segment in segments.into_iter().rev() {
                        let mut child = path.clone();
                        child.push(segment);
                        stack.push((child, origin.clone()));
                    }
                }
                Action::External(target) => {
                    let (resource, fragment) = split_ref(&target);
                    let absolute = resolve_target(origin.as_deref(), resource);
                    match self.ensure_resource(doc, &absolute).await {
                        Some((key, inserted)) => {
                            if let Some(Value::Object(site)) = pointer::get_mut(doc, &path) {
                                site.insert(
                                    "$ref".to_string(),
                                    Value::String(format!("#/{EXT_NAMESPACE}/{key}{fragment}")),
                                );
                            }
                            if inserted {
                                stack.push((
                                    vec![EXT_NAMESPACE.to_string(), key],
                                    Some(absolute),
                                ));
                            }
                        }
                        // Unresolved: the reference stays as it was.
                        None => {}
                    }
                }
                Action::Nothing => {}
            }
        }
    }

    /// Make sure the resource behind `absolute` lives in the reserved
    /// section, fetching it on first sight. Returns its key and whether
    /// this call inserted it; `None` when it cannot be resolved.
    async fn ensure_resource(
        &mut self,
        doc: &mut Value,
        absolute: &str,
    ) -> Option<(String, bool)> {
        if let Some(key) = self.keys.get(absolute) {
            return Some((key.to_string(), false));
        }
        if let Some(error) = self.failed.get(absolute) {
            // Every referencing site gets its own warning entry.
            self.warnings.push(BundleWarning {
                reference: absolute.to_string(),
                error: error.clone(),
            });
            return None;
        }

        let loader = self
            .config
            .loaders
            .iter()
            .find(|loader| loader.validate(absolute));
        let Some(loader) = loader else {
            return self.fail(absolute, LoadError::Unsupported(absolute.to_string()));
        };

        let mut content = match loader.load(absolute).await {
            Ok(content) => content,
            Err(error) => return self.fail(absolute, error),
        };

        let key = match self
            .keys
            .key_for(absolute, |candidate| ext_contains(doc, candidate))
        {
            Some(key) => key,
            None => {
                return self.fail(
                    absolute,
                    LoadError::KeyExhausted(absolute.to_string()),
                )
            }
        };

        // The resource's own internal pointers now live under its key.
        let prefix = [EXT_NAMESPACE.to_string(), key.clone()];
        prefix_internal_ref_recursive(&mut content, &prefix);

        if let Some(section) = ext_section_mut(doc) {
            section.insert(key.clone(), content);
        }
        self.url_map.insert(key.clone(), absolute.to_string());
        Some((key, true))
    }

    fn fail(&mut self, absolute: &str, error: LoadError) -> Option<(String, bool)> {
        tracing::warn!(
            reference = %absolute,
            error = %error,
            "failed to resolve external reference; leaving it unresolved"
        );
        self.warnings.push(BundleWarning {
            reference: absolute.to_string(),
            error: error.clone(),
        });
        self.failed.insert(absolute.to_string(), error);
        None
    }
}

fn ext_contains(doc: &Value, key: &str) -> bool {
    doc.get(EXT_NAMESPACE)
        .and_then(Value::as_object)
        .is_some_and(|section| section.contains_key(key))
}

fn ext_section_mut(doc: &mut Value) -> Option<&mut Map<String, Value>> {
    let Value::Object(root) = doc else {
        return None;
    };
    root.entry(EXT_NAMESPACE.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
}
