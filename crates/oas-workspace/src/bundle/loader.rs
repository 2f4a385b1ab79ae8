//! Resource loaders for the bundler.
//!
//! A loader resolves one kind of external reference target (URL, file
//! path, …). The bundler asks each configured loader in order whether it
//! accepts a target and uses the first that does; a target nobody accepts
//! is reported per reference, not fatal to the bundle.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::rebase::parse_document_body;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("FETCH: {0}")]
    Fetch(String),

    #[error("PARSE: {0}")]
    Parse(String),

    #[error("no loader accepts '{0}'")]
    Unsupported(String),

    #[error("cannot generate a unique key for '{0}'")]
    KeyExhausted(String),
}

/// One way of resolving external reference targets. Injectable and
/// mockable; tests use in-memory maps instead of the network.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Whether this loader knows how to resolve `target`.
    fn validate(&self, target: &str) -> bool;

    /// Fetch and parse the resource. Bodies may be JSON or YAML.
    async fn load(&self, target: &str) -> Result<Value, LoadError>;
}

/// Parse a fetched body as JSON first, YAML second.
pub(crate) fn parse_body(target: &str, body: &str) -> Result<Value, LoadError> {
    parse_document_body(body).map_err(|e| LoadError::Parse(format!("{target}: {e}")))
}
