//! Shared-node JSON value graph.
//!
//! A bundled document addresses every node by pointer path, but a *resolved*
//! view of it materializes `$ref` targets in place: many reference sites
//! point at one target node, and circular references produce genuine cycles.
//! [`SharedValue`] represents such a view; containers are handles
//! (`Rc<RefCell<..>>`), so aliasing and cycles are expressible.
//!
//! [`clone_shared`] deep-clones a graph while keeping its exact topology: a
//! node reachable through two paths in the source is one node reachable
//! through two paths in the clone, and cyclic input terminates. The
//! traversal threads a visited map from source container identity to its
//! created clone and consults it before recursing (an identity-map pattern,
//! independent of any garbage-collector behavior).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Number, Value};
use thiserror::Error;

/// A JSON value whose containers are shared handles.
///
/// The derived `Clone` is shallow: it copies the handle, not the container.
/// Use [`clone_shared`] for a deep copy.
#[derive(Debug, Clone)]
pub enum SharedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Rc<RefCell<Vec<SharedValue>>>),
    Object(Rc<RefCell<IndexMap<String, SharedValue>>>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedValueError {
    #[error("CYCLE")]
    Cycle,
}

impl SharedValue {
    /// A fresh empty object node.
    pub fn empty_object() -> Self {
        SharedValue::Object(Rc::new(RefCell::new(IndexMap::new())))
    }

    /// A fresh empty array node.
    pub fn empty_array() -> Self {
        SharedValue::Array(Rc::new(RefCell::new(Vec::new())))
    }

    /// Insert a member into an object node. No-op on non-objects.
    pub fn insert(&self, key: &str, value: SharedValue) {
        if let SharedValue::Object(map) = self {
            map.borrow_mut().insert(key.to_string(), value);
        }
    }

    /// Push an element onto an array node. No-op on non-arrays.
    pub fn push(&self, value: SharedValue) {
        if let SharedValue::Array(arr) = self {
            arr.borrow_mut().push(value);
        }
    }

    /// Look up an object member, returning a shallow handle.
    pub fn get(&self, key: &str) -> Option<SharedValue> {
        match self {
            SharedValue::Object(map) => map.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Whether two values are the *same* container node.
    ///
    /// Scalars are never identical in this sense.
    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        match (self, other) {
            (SharedValue::Array(a), SharedValue::Array(b)) => Rc::ptr_eq(a, b),
            (SharedValue::Object(a), SharedValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Build a graph from a plain tree. Every container becomes a fresh,
    /// unshared node.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => SharedValue::Null,
            Value::Bool(b) => SharedValue::Bool(*b),
            Value::Number(n) => SharedValue::Number(n.clone()),
            Value::String(s) => SharedValue::String(s.clone()),
            Value::Array(arr) => {
                let items = arr.iter().map(SharedValue::from_value).collect();
                SharedValue::Array(Rc::new(RefCell::new(items)))
            }
            Value::Object(obj) => {
                let mut map = IndexMap::new();
                for (key, val) in obj {
                    map.insert(key.clone(), SharedValue::from_value(val));
                }
                SharedValue::Object(Rc::new(RefCell::new(map)))
            }
        }
    }

    /// Flatten the graph back into a plain tree.
    ///
    /// Shared nodes are duplicated. Fails with [`SharedValueError::Cycle`]
    /// when the graph is cyclic, since a tree cannot express it.
    pub fn to_value(&self) -> Result<Value, SharedValueError> {
        let mut in_progress = Vec::new();
        self.to_value_inner(&mut in_progress)
    }

    fn to_value_inner(&self, in_progress: &mut Vec<usize>) -> Result<Value, SharedValueError> {
        match self {
            SharedValue::Null => Ok(Value::Null),
            SharedValue::Bool(b) => Ok(Value::Bool(*b)),
            SharedValue::Number(n) => Ok(Value::Number(n.clone())),
            SharedValue::String(s) => Ok(Value::String(s.clone())),
            SharedValue::Array(arr) => {
                let id = Rc::as_ptr(arr) as usize;
                if in_progress.contains(&id) {
                    return Err(SharedValueError::Cycle);
                }
                in_progress.push(id);
                let mut items = Vec::with_capacity(arr.borrow().len());
                for item in arr.borrow().iter() {
                    items.push(item.to_value_inner(in_progress)?);
                }
                in_progress.pop();
                Ok(Value::Array(items))
            }
            SharedValue::Object(map) => {
                let id = Rc::as_ptr(map) as usize;
                if in_progress.contains(&id) {
                    return Err(SharedValueError::Cycle);
                }
                in_progress.push(id);
                let mut out = serde_json::Map::new();
                for (key, val) in map.borrow().iter() {
                    out.insert(key.clone(), val.to_value_inner(in_progress)?);
                }
                in_progress.pop();
                Ok(Value::Object(out))
            }
        }
    }
}

/// Deep-clones a value graph, preserving its sharing and cycle topology.
///
/// A container visited twice in the source maps to the same clone both
/// times; self-referential input terminates.
///
/// # Examples
///
/// ```
/// use oas_json::json_clone::{clone_shared, SharedValue};
///
/// let target = SharedValue::empty_object();
/// let root = SharedValue::empty_object();
/// root.insert("a", target.clone());
/// root.insert("b", target.clone());
///
/// let cloned = clone_shared(&root);
/// let a = cloned.get("a").unwrap();
/// let b = cloned.get("b").unwrap();
/// assert!(a.ptr_eq(&b));
/// assert!(!a.ptr_eq(&target));
/// ```
pub fn clone_shared(value: &SharedValue) -> SharedValue {
    let mut visited: HashMap<usize, SharedValue> = HashMap::new();
    clone_inner(value, &mut visited)
}

fn clone_inner(value: &SharedValue, visited: &mut HashMap<usize, SharedValue>) -> SharedValue {
    match value {
        SharedValue::Null => SharedValue::Null,
        SharedValue::Bool(b) => SharedValue::Bool(*b),
        SharedValue::Number(n) => SharedValue::Number(n.clone()),
        SharedValue::String(s) => SharedValue::String(s.clone()),
        SharedValue::Array(arr) => {
            let id = Rc::as_ptr(arr) as usize;
            if let Some(existing) = visited.get(&id) {
                return existing.clone();
            }
            let target = Rc::new(RefCell::new(Vec::new()));
            // Register the clone before recursing so cycles resolve to it.
            visited.insert(id, SharedValue::Array(Rc::clone(&target)));
            let items: Vec<SharedValue> = arr.borrow().clone();
            for item in &items {
                target.borrow_mut().push(clone_inner(item, visited));
            }
            SharedValue::Array(target)
        }
        SharedValue::Object(map) => {
            let id = Rc::as_ptr(map) as usize;
            if let Some(existing) = visited.get(&id) {
                return existing.clone();
            }
            let target = Rc::new(RefCell::new(IndexMap::new()));
            visited.insert(id, SharedValue::Object(Rc::clone(&target)));
            let entries: Vec<(String, SharedValue)> = map
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (key, val) in &entries {
                target
                    .borrow_mut()
                    .insert(key.clone(), clone_inner(val, visited));
            }
            SharedValue::Object(target)
        }
    }
}
