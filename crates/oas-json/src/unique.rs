//! Unique value generation with bounded retries.
//!
//! Derives a unique human-readable identifier from a candidate value and a
//! uniqueness predicate. When the candidate is taken, an incrementing
//! counter is appended (`"foo"`, `"foo 1"`, `"foo 2"`, …) until the
//! predicate accepts or the retry budget is exhausted. The candidate
//! sequence is fully deterministic for a deterministic predicate.

use std::future::Future;

/// Generate a unique value, validating the candidate as-is.
///
/// Equivalent to [`generate_unique_value_with`] with an identity transform.
///
/// # Examples
///
/// ```
/// use oas_json::unique::generate_unique_value;
///
/// let taken = ["foo", "foo 1"];
/// let value = generate_unique_value("foo", |c| !taken.contains(&c), 10);
/// assert_eq!(value.as_deref(), Some("foo 2"));
/// ```
pub fn generate_unique_value<V>(default_value: &str, validate: V, max_retries: usize) -> Option<String>
where
    V: FnMut(&str) -> bool,
{
    generate_unique_value_with(default_value, validate, |s| s.to_string(), max_retries)
}

/// Generate a unique value, transforming the default before validation.
///
/// The transformed base is validated first; on rejection, counters starting
/// at 1 are appended with a single space, each candidate validated in turn.
/// Returns `None` once `max_retries` counters have been rejected, so the
/// predicate runs at most `max_retries + 1` times.
pub fn generate_unique_value_with<V, T>(
    default_value: &str,
    mut validate: V,
    transform: T,
    max_retries: usize,
) -> Option<String>
where
    V: FnMut(&str) -> bool,
    T: Fn(&str) -> String,
{
    let base = transform(default_value);
    if validate(&base) {
        return Some(base);
    }
    for counter in 1..=max_retries {
        let candidate = format!("{base} {counter}");
        if validate(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Async variant of [`generate_unique_value`].
///
/// Validator calls are awaited strictly in sequence; there is no
/// speculative lookahead, so a validator with side effects observes the
/// same call order as the sync variant.
pub async fn generate_unique_value_async<V, Fut>(
    default_value: &str,
    mut validate: V,
    max_retries: usize,
) -> Option<String>
where
    V: FnMut(String) -> Fut,
    Fut: Future<Output = bool>,
{
    let base = default_value.to_string();
    if validate(base.clone()).await {
        return Some(base);
    }
    for counter in 1..=max_retries {
        let candidate = format!("{base} {counter}");
        if validate(candidate.clone()).await {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn returns_default_when_valid() {
        let value = generate_unique_value("foo", |_| true, 10);
        assert_eq!(value.as_deref(), Some("foo"));
    }

    #[test]
    fn deterministic_candidate_order() {
        let calls = RefCell::new(Vec::new());
        let value = generate_unique_value(
            "foo",
            |candidate| {
                calls.borrow_mut().push(candidate.to_string());
                candidate == "foo 3"
            },
            10,
        );
        assert_eq!(value.as_deref(), Some("foo 3"));
        assert_eq!(*calls.borrow(), ["foo", "foo 1", "foo 2", "foo 3"]);
    }

    #[test]
    fn exhaustion_returns_none() {
        let calls = RefCell::new(0usize);
        let value = generate_unique_value(
            "foo",
            |_| {
                *calls.borrow_mut() += 1;
                false
            },
            3,
        );
        assert_eq!(value, None);
        // base + 3 retries
        assert_eq!(*calls.borrow(), 4);
    }

    #[test]
    fn applies_transform_before_validation() {
        let value = generate_unique_value_with("Hello World", |_| true, |s| s.to_lowercase(), 5);
        assert_eq!(value.as_deref(), Some("hello world"));
    }

    #[test]
    fn counter_appends_to_transformed_base() {
        let value = generate_unique_value_with(
            "Hello",
            |candidate| candidate == "hello 1",
            |s| s.to_lowercase(),
            5,
        );
        assert_eq!(value.as_deref(), Some("hello 1"));
    }

    #[test]
    fn zero_retries_validates_once() {
        let calls = RefCell::new(0usize);
        let value = generate_unique_value(
            "foo",
            |_| {
                *calls.borrow_mut() += 1;
                false
            },
            0,
        );
        assert_eq!(value, None);
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn async_variant_matches_sync_order() {
        let calls = RefCell::new(Vec::new());
        let value = generate_unique_value_async(
            "foo",
            |candidate: String| {
                calls.borrow_mut().push(candidate.clone());
                async move { candidate == "foo 2" }
            },
            10,
        )
        .await;
        assert_eq!(value.as_deref(), Some("foo 2"));
        assert_eq!(*calls.borrow(), ["foo", "foo 1", "foo 2"]);
    }

    #[tokio::test]
    async fn async_variant_exhaustion() {
        let calls = RefCell::new(0usize);
        let value = generate_unique_value_async(
            "foo",
            |_| {
                *calls.borrow_mut() += 1;
                async { false }
            },
            3,
        )
        .await;
        assert_eq!(value, None);
        assert_eq!(*calls.borrow(), 4);
    }
}
