//! Deep cloning of JSON values.
//!
//! [`clone`] copies plain [`serde_json::Value`] trees. The [`shared`]
//! submodule provides a shared-node value graph for resolved-reference
//! views, together with an identity-preserving clone that keeps aliased
//! and cyclic sub-structures intact.

use serde_json::{Map, Value};

pub mod shared;

pub use shared::{clone_shared, SharedValue};

/// Creates a deep clone of any JSON value.
///
/// Primitives are copied, arrays and objects are rebuilt recursively so
/// that no mutation of the clone is observable on the original.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use oas_json::json_clone::clone;
///
/// let original = json!({"foo": [1, 2, 3]});
/// let cloned = clone(&original);
///
/// assert_eq!(original, cloned);
/// ```
pub fn clone(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.clone()),
        Value::Array(arr) => Value::Array(arr.iter().map(clone).collect()),
        Value::Object(obj) => {
            let mut new_obj = Map::new();
            for (key, val) in obj {
                new_obj.insert(key.clone(), clone(val));
            }
            Value::Object(new_obj)
        }
    }
}
