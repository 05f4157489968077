//! Concrete feed fetchers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Fetcher, RawPosting, require_entries, rss};
use crate::utils::fs::io_error;
use crate::{Error, Result};

/// Fetches the feed over HTTP.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn source_name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<RawPosting>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("feed request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "feed request returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read feed body: {}", e)))?;
        debug!(url = %self.url, bytes = body.len(), "Fetched feed");

        require_entries(&self.url, rss::parse_feed(&body)?)
    }
}

/// Reads the feed from a local file instead of the network.
///
/// Used for sandbox runs against a saved copy of the feed.
pub struct FixtureFetcher {
    path: PathBuf,
    name: String,
}

impl FixtureFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawPosting>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| io_error("reading feed fixture", &self.path, e))?;
        debug!(path = %self.name, bytes = body.len(), "Read feed fixture");

        require_entries(&self.name, rss::parse_feed(&body)?)
    }
}
