//! Content hashing for compressed reference keys.

use sha1::{Digest, Sha1};

/// Number of hex characters kept from the digest. Matches the git-style
/// short hash length used in bundled documents.
const SHORT_HASH_LEN: usize = 7;

/// Hash an external identifier (URL or file path) into a short,
/// collision-resistant key.
///
/// Returns the first 7 hex characters of the SHA-1 digest.
///
/// # Examples
///
/// ```
/// use oas_json::hash::short_hash;
///
/// assert_eq!(short_hash("hello"), "aaf4c61");
/// ```
pub fn short_hash(input: &str) -> String {
    let digest = Sha1::digest(input.as_bytes());
    let mut out = String::with_capacity(SHORT_HASH_LEN);
    for byte in digest.iter() {
        out.push_str(&format!("{byte:02x}"));
        if out.len() >= SHORT_HASH_LEN {
            break;
        }
    }
    out.truncate(SHORT_HASH_LEN);
    out
}
