//! Structural diff between two JSON documents.

use oas_json::deep_equal;
use serde_json::Value;

use super::Change;

/// Compute the minimal structural changes turning `before` into `after`.
///
/// Changes are scoped to the deepest differing paths: a changed nested
/// value produces a change for that value, not a coarse update of its
/// parent, unless the two sides are different container kinds.
///
/// Per node the output order is deterministic: recursions/updates in
/// `before` key order, then additions in `after` key order, then
/// deletions. Array deletions at one parent are emitted in descending
/// index order so that applying them sequentially splices from the end
/// and never invalidates a later index; additions are ascending. A single
/// diff never produces both additions and deletions on the same array.
///
/// `diff(a, a)` is empty for every `a`.
pub fn diff(before: &Value, after: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut path = Vec::new();
    diff_inner(before, after, &mut path, &mut changes);
    changes
}

fn diff_inner(before: &Value, after: &Value, path: &mut Vec<String>, out: &mut Vec<Change>) {
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            let mut deletions = Vec::new();
            for (key, val_a) in a {
                match b.get(key) {
                    Some(val_b) => {
                        if !deep_equal(val_a, val_b) {
                            path.push(key.clone());
                            diff_inner(val_a, val_b, path, out);
                            path.pop();
                        }
                    }
                    None => {
                        let mut deleted_path = path.clone();
                        deleted_path.push(key.clone());
                        deletions.push(Change::delete(deleted_path, val_a.clone()));
                    }
                }
            }
            for (key, val_b) in b {
                if !a.contains_key(key) {
                    let mut added_path = path.clone();
                    added_path.push(key.clone());
                    out.push(Change::add(added_path, val_b.clone()));
                }
            }
            out.extend(deletions);
        }
        (Value::Array(a), Value::Array(b)) => {
            let shared = a.len().min(b.len());
            for i in 0..shared {
                if !deep_equal(&a[i], &b[i]) {
                    path.push(i.to_string());
                    diff_inner(&a[i], &b[i], path, out);
                    path.pop();
                }
            }
            for i in shared..b.len() {
                let mut added_path = path.clone();
                added_path.push(i.to_string());
                out.push(Change::add(added_path, b[i].clone()));
            }
            for i in (shared..a.len()).rev() {
                let mut deleted_path = path.clone();
                deleted_path.push(i.to_string());
                out.push(Change::delete(deleted_path, a[i].clone()));
            }
        }
        _ => {
            if !deep_equal(before, after) {
                out.push(Change::update(path.clone(), after.clone()));
            }
        }
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
    fn identical_documents_produce_no_changes() {
        let doc = json!({
            "openapi": "3.1.1",
            "info": {"title": "API", "version": "1.0.0"},
            "paths": {"/users": {"get": {"summary": "Get users"}}},
            "tags": [{"name": "a"}, {"name": "b"}],
        });
        assert_eq!(diff(&doc, &doc), vec![]);
    }

    #[test]
    fn added_key() {
        let before = json!({"info": {"title": "API"}});
        let after = json!({"info": {"title": "API", "description": "docs"}});
        assert_eq!(
            diff(&before, &after),
            vec![Change::add(path(&["info", "description"]), json!("docs"))]
        );
    }

    #[test]
    fn updated_key_scopes_to_deepest_path() {
        let before = json!({"info": {"title": "API", "version": "1.0.0"}});
        let after = json!({"info": {"title": "New title", "version": "1.0.0"}});
        assert_eq!(
            diff(&before, &after),
            vec![Change::update(path(&["info", "title"]), json!("New title"))]
        );
    }

    #[test]
    fn deleted_key_carries_removed_value() {
        let before = json!({"info": {"title": "API", "version": "1.0.0"}});
        let after = json!({"info": {"title": "API"}});
        assert_eq!(
            diff(&before, &after),
            vec![Change::delete(path(&["info", "version"]), json!("1.0.0"))]
        );
    }

    #[test]
    fn kind_mismatch_is_a_single_coarse_update() {
        let before = json!({"a": {"nested": true}});
        let after = json!({"a": [1, 2]});
        assert_eq!(
            diff(&before, &after),
            vec![Change::update(path(&["a"]), json!([1, 2]))]
        );
    }

    #[test]
    fn root_scalar_update() {
        assert_eq!(
            diff(&json!("old"), &json!("new")),
            vec![Change::update(vec![], json!("new"))]
        );
    }

    #[test]
    fn array_element_update_recurses() {
        let before = json!({"servers": [{"url": "a"}, {"url": "b"}]});
        let after = json!({"servers": [{"url": "a"}, {"url": "c"}]});
        assert_eq!(
            diff(&before, &after),
            vec![Change::update(path(&["servers", "1", "url"]), json!("c"))]
        );
    }

    #[test]
    fn array_growth_appends_in_ascending_order() {
        let before = json!({"tags": ["a"]});
        let after = json!({"tags": ["a", "b", "c"]});
        assert_eq!(
            diff(&before, &after),
            vec![
                Change::add(path(&["tags", "1"]), json!("b")),
                Change::add(path(&["tags", "2"]), json!("c")),
            ]
        );
    }

    #[test]
    fn array_shrink_deletes_in_descending_order() {
        let before = json!({"tags": ["a", "b", "c"]});
        let after = json!({"tags": ["a"]});
        assert_eq!(
            diff(&before, &after),
            vec![
                Change::delete(path(&["tags", "2"]), json!("c")),
                Change::delete(path(&["tags", "1"]), json!("b")),
            ]
        );
    }

    #[test]
    fn object_changes_emit_updates_then_adds_then_deletes() {
        let before = json!({"keep": 1, "change": 2, "drop": 3});
        let after = json!({"keep": 1, "change": 20, "fresh": 4});
        assert_eq!(
            diff(&before, &after),
            vec![
                Change::update(path(&["change"]), json!(20)),
                Change::add(path(&["fresh"]), json!(4)),
                Change::delete(path(&["drop"]), json!(3)),
            ]
        );
    }

    #[test]
    fn whole_subtree_addition_is_one_change() {
        let before = json!({"paths": {}});
        let after = json!({"paths": {"/users": {"get": {"summary": "Get users"}}}});
        assert_eq!(
            diff(&before, &after),
            vec![Change::add(
                path(&["paths", "/users"]),
                json!({"get": {"summary": "Get users"}})
            )]
        );
    }
}
