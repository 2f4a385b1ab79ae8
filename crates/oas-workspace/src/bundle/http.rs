//! HTTP-backed loader and remote source.

use async_trait::async_trait;
use serde_json::Value;

use oas_json::pointer::is_remote_url;

use super::loader::{parse_body, LoadError, Loader};
use crate::rebase::{FetchError, RemoteSource};

/// Resolves `http(s)://` targets with a shared [`reqwest::Client`].
///
/// Implements both bundler-side [`Loader`] and coordinator-side
/// [`RemoteSource`], so one client serves reference resolution and
/// document polling alike.
#[derive(Debug, Clone, Default)]
pub struct UrlLoader {
    client: reqwest::Client,
}

impl UrlLoader {
    pub fn new() -> Self {
        UrlLoader::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        UrlLoader { client }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Loader for UrlLoader {
    fn validate(&self, target: &str) -> bool {
        is_remote_url(target)
    }

    async fn load(&self, target: &str) -> Result<Value, LoadError> {
        let body = self
            .fetch_text(target)
            .await
            .map_err(|e| LoadError::Fetch(format!("{target}: {e}")))?;
        parse_body(target, &body)
    }
}

#[async_trait]
impl RemoteSource for UrlLoader {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_text(url).await.map_err(FetchError)
    }
}
