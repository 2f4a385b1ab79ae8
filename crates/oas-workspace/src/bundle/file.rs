//! Filesystem-backed loader.

use async_trait::async_trait;
use serde_json::Value;

use oas_json::pointer::{is_local_ref, is_remote_url};

use super::loader::{parse_body, LoadError, Loader};

/// Resolves plain path targets (`./schemas/user.yaml`,
/// `/abs/path/spec.json`) from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        FileLoader
    }
}

#[async_trait]
impl Loader for FileLoader {
    fn validate(&self, target: &str) -> bool {
        !is_remote_url(target) && !is_local_ref(target) && !target.is_empty()
    }

    async fn load(&self, target: &str) -> Result<Value, LoadError> {
        let body = tokio::fs::read_to_string(target)
            .await
            .map_err(|e| LoadError::Fetch(format!("{target}: {e}")))?;
        parse_body(target, &body)
    }
}
