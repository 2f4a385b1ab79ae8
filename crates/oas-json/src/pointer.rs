//! Fragment pointer utilities.
//!
//! OpenAPI documents address nodes with `$ref` fragment pointers of the
//! form `#/paths/~1users/get`. This module converts between those strings
//! and path segment lists (with RFC 6901 escaping), descends into values by
//! path, and classifies reference targets.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("NOT_A_FRAGMENT: {0}")]
    NotAFragment(String),
}

/// Unescapes a pointer segment: `~1` becomes `/`, `~0` becomes `~`.
pub fn unescape_segment(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer segment: `~` becomes `~0`, `/` becomes `~1`.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    // Order matters: ~ must be escaped before /
    segment.replace('~', "~0").replace('/', "~1")
}

/// Parse a fragment pointer (`#`, `#/a/b`) into path segments.
///
/// `#` and the empty fragment address the root and yield an empty path.
///
/// # Examples
///
/// ```
/// use oas_json::pointer::parse_fragment;
///
/// assert_eq!(parse_fragment("#").unwrap(), Vec::<String>::new());
/// assert_eq!(parse_fragment("#/a/b").unwrap(), vec!["a", "b"]);
/// assert_eq!(parse_fragment("#/a~1b").unwrap(), vec!["a/b"]);
/// ```
pub fn parse_fragment(pointer: &str) -> Result<Vec<String>, PointerError> {
    let rest = pointer
        .strip_prefix('#')
        .ok_or_else(|| PointerError::NotAFragment(pointer.to_string()))?;
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    // A non-empty fragment pointer starts with '/'
    let rest = rest
        .strip_prefix('/')
        .ok_or_else(|| PointerError::NotAFragment(pointer.to_string()))?;
    Ok(rest.split('/').map(unescape_segment).collect())
}

/// Format path segments as a fragment pointer. The empty path is `#`.
///
/// # Examples
///
/// ```
/// use oas_json::pointer::format_fragment;
///
/// assert_eq!(format_fragment(&[]), "#");
/// assert_eq!(format_fragment(&["a".to_string(), "b".to_string()]), "#/a/b");
/// ```
pub fn format_fragment(path: &[String]) -> String {
    let mut out = String::from("#");
    for segment in path {
        out.push('/');
        out.push_str(&escape_segment(segment));
    }
    out
}

/// Whether a `$ref` target points inside the same document.
pub fn is_local_ref(target: &str) -> bool {
    target.starts_with('#')
}

/// Whether a `$ref` target is a remote URL (http or https).
pub fn is_remote_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Check if `parent` is a strict prefix of `child`.
pub fn is_prefix_of(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && parent.iter().zip(child.iter()).all(|(a, b)| a == b)
}

/// Whether two paths address overlapping locations: equal, or one is an
/// ancestor of the other.
pub fn paths_overlap(a: &[String], b: &[String]) -> bool {
    let shorter = a.len().min(b.len());
    a[..shorter] == b[..shorter]
}

/// Get a value by path. Numeric segments index into arrays.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use oas_json::pointer::get;
///
/// let doc = json!({"a": {"b": [10, 20]}});
/// let path = ["a".to_string(), "b".to_string(), "1".to_string()];
/// assert_eq!(get(&doc, &path), Some(&json!(20)));
/// ```
pub fn get<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            Value::Array(arr) => {
                let idx: usize = segment.parse().ok()?;
                current = arr.get(idx)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Get a mutable reference to a value by path.
pub fn get_mut<'a>(value: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in path {
        match current {
            Value::Object(map) => current = map.get_mut(segment)?,
            Value::Array(arr) => {
                let idx: usize = segment.parse().ok()?;
                current = arr.get_mut(idx)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
