//! Structural equality for JSON values.

use serde_json::Value;

/// Performs a deep equality check between two JSON values.
///
/// Object comparison is key-order insensitive; array comparison is
/// element-by-element and order sensitive. Values of different types are
/// never equal.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use oas_json::json_equal::deep_equal;
///
/// let a = json!({"foo": [1, 2, 3]});
/// let b = json!({"foo": [1, 2, 3]});
/// let c = json!({"foo": [1, 2, 4]});
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            if arr_a.len() != arr_b.len() {
                return false;
            }
            arr_a
                .iter()
                .zip(arr_b.iter())
                .all(|(x, y)| deep_equal(x, y))
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a.iter().all(|(key, val_a)| match obj_b.get(key) {
                Some(val_b) => deep_equal(val_a, val_b),
                None => false,
            })
        }

        _ => false,
    }
}
