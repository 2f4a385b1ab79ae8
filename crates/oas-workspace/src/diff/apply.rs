//! Patch application.

use oas_json::json_clone::clone;
use oas_json::pointer::{format_fragment, get_mut};
use serde_json::Value;
use thiserror::Error;

use super::{Change, ChangeKind};

/// Errors produced while replaying changes against a document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// A change's path cannot be resolved against the current document
    /// shape: a missing intermediate container, an absent target for
    /// update/delete, an already-present target for add, or an invalid
    /// array index.
    #[error("INVALID_CHANGES: cannot apply {kind:?} at '{pointer}'")]
    InvalidChangesDetected {
        kind: ChangeKind,
        /// Fragment pointer form of the offending path.
        pointer: String,
    },
}

fn invalid(change: &Change) -> ApplyError {
    ApplyError::InvalidChangesDetected {
        kind: change.kind,
        pointer: format_fragment(&change.path),
    }
}

/// Apply a list of changes to a cloned copy of `doc`, in order.
///
/// The input document is never mutated. The first unresolvable change
/// aborts the whole application; no partially patched document escapes.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use oas_workspace::diff::{apply_changes, diff};
///
/// let before = json!({"info": {"title": "API"}});
/// let after = json!({"info": {"title": "Renamed"}});
/// let patched = apply_changes(&before, &diff(&before, &after)).unwrap();
/// assert_eq!(patched, after);
/// ```
pub fn apply_changes(doc: &Value, changes: &[Change]) -> Result<Value, ApplyError> {
    let mut out = clone(doc);
    for change in changes {
        apply_one(&mut out, change)?;
    }
    Ok(out)
}

fn apply_one(doc: &mut Value, change: &Change) -> Result<(), ApplyError> {
    if change.path.is_empty() {
        // Only a whole-document update makes sense at the root.
        return match change.kind {
            ChangeKind::Update => {
                *doc = change.value.clone();
                Ok(())
            }
            ChangeKind::Add | ChangeKind::Delete => Err(invalid(change)),
        };
    }

    let (parent_path, last) = change.path.split_at(change.path.len() - 1);
    let last = &last[0];
    let parent = get_mut(doc, parent_path).ok_or_else(|| invalid(change))?;

    match parent {
        Value::Object(map) => match change.kind {
            ChangeKind::Add => {
                if map.contains_key(last) {
                    return Err(invalid(change));
                }
                map.insert(last.clone(), change.value.clone());
                Ok(())
            }
            ChangeKind::Update => {
                if !map.contains_key(last) {
                    return Err(invalid(change));
                }
                map.insert(last.clone(), change.value.clone());
                Ok(())
            }
            ChangeKind::Delete => {
                map.shift_remove(last).ok_or_else(|| invalid(change))?;
                Ok(())
            }
        },
        Value::Array(arr) => {
            let idx: usize = last.parse().map_err(|_| invalid(change))?;
            match change.kind {
                ChangeKind::Add => {
                    // Numeric segments are insertion points: existing
                    // elements shift right, index == len appends.
                    if idx > arr.len() {
                        return Err(invalid(change));
                    }
                    arr.insert(idx, change.value.clone());
                    Ok(())
                }
                ChangeKind::Update => {
                    if idx >= arr.len() {
                        return Err(invalid(change));
                    }
                    arr[idx] = change.value.clone();
                    Ok(())
                }
                ChangeKind::Delete => {
                    if idx >= arr.len() {
                        return Err(invalid(change));
                    }
                    arr.remove(idx);
                    Ok(())
                }
            }
        }
        _ => Err(invalid(change)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn input_document_is_untouched() {
        let doc = json!({"a": 1});
        let patched =
            apply_changes(&doc, &[Change::update(path(&["a"]), json!(2))]).unwrap();
        assert_eq!(doc, json!({"a": 1}));
        assert_eq!(patched, json!({"a": 2}));
    }

    #[test]
    fn add_to_object() {
        let doc = json!({"a": 1});
        let patched = apply_changes(&doc, &[Change::add(path(&["b"]), json!({"x": 1}))]).unwrap();
        assert_eq!(patched, json!({"a": 1, "b": {"x": 1}}));
    }

    #[test]
    fn add_fails_on_missing_parent() {
        let doc = json!({"a": 1});
        let err = apply_changes(&doc, &[Change::add(path(&["b", "c"]), json!({"x": 1}))])
            .unwrap_err();
        assert!(matches!(
            err,
            ApplyError::InvalidChangesDetected { kind: ChangeKind::Add, .. }
        ));
    }

    #[test]
    fn add_fails_on_existing_key() {
        let doc = json!({"a": 1});
        assert!(apply_changes(&doc, &[Change::add(path(&["a"]), json!(2))]).is_err());
    }

    #[test]
    fn update_fails_on_missing_key() {
        let doc = json!({"a": 1});
        assert!(apply_changes(&doc, &[Change::update(path(&["b"]), json!(2))]).is_err());
    }

    #[test]
    fn delete_fails_on_missing_key() {
        let doc = json!({"a": 1});
        assert!(
            apply_changes(&doc, &[Change::delete(path(&["b"]), json!(null))]).is_err()
        );
    }

    #[test]
    fn scalar_parent_is_invalid() {
        let doc = json!({"a": 1});
        assert!(apply_changes(&doc, &[Change::add(path(&["a", "b"]), json!(2))]).is_err());
    }

    #[test]
    fn array_delete_splices() {
        let doc = json!({"hobbies": ["swimming", "fish", "coding"]});
        let patched = apply_changes(
            &doc,
            &[Change::delete(path(&["hobbies", "1"]), json!("fish"))],
        )
        .unwrap();
        assert_eq!(patched, json!({"hobbies": ["swimming", "coding"]}));
    }

    #[test]
    fn array_add_splices_in() {
        let doc = json!({"tags": ["a", "c"]});
        let patched =
            apply_changes(&doc, &[Change::add(path(&["tags", "1"]), json!("b"))]).unwrap();
        assert_eq!(patched, json!({"tags": ["a", "b", "c"]}));
    }

    #[test]
    fn array_add_appends_at_len() {
        let doc = json!({"tags": ["a"]});
        let patched =
            apply_changes(&doc, &[Change::add(path(&["tags", "1"]), json!("b"))]).unwrap();
        assert_eq!(patched, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn array_add_beyond_len_fails() {
        let doc = json!({"tags": ["a"]});
        assert!(apply_changes(&doc, &[Change::add(path(&["tags", "5"]), json!("b"))]).is_err());
    }

    #[test]
    fn array_update_overwrites() {
        let doc = json!({"tags": ["a", "b"]});
        let patched =
            apply_changes(&doc, &[Change::update(path(&["tags", "0"]), json!("z"))]).unwrap();
        assert_eq!(patched, json!({"tags": ["z", "b"]}));
    }

    #[test]
    fn array_non_numeric_segment_fails() {
        let doc = json!({"tags": ["a"]});
        assert!(
            apply_changes(&doc, &[Change::update(path(&["tags", "x"]), json!("z"))]).is_err()
        );
    }

    #[test]
    fn root_update_replaces_document() {
        let doc = json!({"a": 1});
        let patched = apply_changes(&doc, &[Change::update(vec![], json!({"b": 2}))]).unwrap();
        assert_eq!(patched, json!({"b": 2}));
    }

    #[test]
    fn root_add_and_delete_are_invalid() {
        let doc = json!({"a": 1});
        assert!(apply_changes(&doc, &[Change::add(vec![], json!(1))]).is_err());
        assert!(apply_changes(&doc, &[Change::delete(vec![], json!(1))]).is_err());
    }

    #[test]
    fn sequential_changes_build_on_each_other() {
        let doc = json!({"paths": {}});
        let patched = apply_changes(
            &doc,
            &[
                Change::add(path(&["paths", "/users"]), json!({})),
                Change::add(path(&["paths", "/users", "get"]), json!({"summary": "s"})),
                Change::update(
                    path(&["paths", "/users", "get", "summary"]),
                    json!("updated"),
                ),
            ],
        )
        .unwrap();
        assert_eq!(
            patched,
            json!({"paths": {"/users": {"get": {"summary": "updated"}}}})
        );
    }

    #[test]
    fn failure_leaves_no_partial_result() {
        let doc = json!({"a": 1});
        let result = apply_changes(
            &doc,
            &[
                Change::add(path(&["b"]), json!(2)),
                Change::update(path(&["missing"]), json!(3)),
            ],
        );
        assert!(result.is_err());
        assert_eq!(doc, json!({"a": 1}));
    }
}
