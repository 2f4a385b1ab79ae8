//! Compressed reference keys.
//!
//! Every inlined external resource is addressed by a short hash-derived
//! key under the reserved namespace. Keys are never purely numeric (a
//! numeric object key would be ambiguous with an array index inside a
//! pointer), and one generator instance always maps the same input to the
//! same key.

use std::collections::HashMap;

use oas_json::short_hash;
use oas_json::unique::generate_unique_value_with;

/// Retry budget for hash collisions. Collisions on a 28-bit prefix are
/// already rare; colliding through every counter suffix is pathological.
const MAX_KEY_RETRIES: usize = 32;

/// Per-bundle-pass key generator.
///
/// Explicit state owned by the bundling invocation: independent bundle
/// runs never share or interfere through process-wide caches.
#[derive(Debug, Default)]
pub struct CompressedKeys {
    cache: HashMap<String, String>,
}

impl CompressedKeys {
    pub fn new() -> Self {
        CompressedKeys::default()
    }

    /// Key previously generated for `input`, if any.
    pub fn get(&self, input: &str) -> Option<&str> {
        self.cache.get(input).map(String::as_str)
    }

    /// Generate (or recall) the key for `input`.
    ///
    /// `is_taken` reports whether a candidate key is already used by an
    /// unrelated resource; on a collision the candidate is retried with a
    /// counter suffix. Returns `None` only when the retry budget is
    /// exhausted — the caller must treat that as a hard failure for this
    /// reference.
    pub fn key_for<F>(&mut self, input: &str, mut is_taken: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        if let Some(existing) = self.cache.get(input) {
            return Some(existing.clone());
        }
        let taken_in_cache: Vec<&String> = self.cache.values().collect();
        let key = generate_unique_value_with(
            input,
            |candidate| {
                !is_taken(candidate) && !taken_in_cache.iter().any(|k| k.as_str() == candidate)
            },
            hash_transform,
            MAX_KEY_RETRIES,
        )?;
        self.cache.insert(input.to_string(), key.clone());
        Some(key)
    }

    /// Iterate the input -> key mapping built so far.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cache.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Hash an identifier into a candidate key, guarding against purely
/// numeric output.
fn hash_transform(input: &str) -> String {
    let hashed = short_hash(input);
    if hashed.bytes().all(|b| b.is_ascii_digit()) {
        format!("x{hashed}")
    } else {
        hashed
    }
}
