//! HTTP client for fetching the product page.

use crate::error::WatchError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Trait for fetching page markup - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page at `url` and returns its markup.
    async fn fetch(&self, url: &str) -> Result<String, WatchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, WatchError> {
        (**self).fetch(url).await
    }
}

/// reqwest-backed fetcher with bounded timeouts so a hung remote
/// endpoint cannot stall the watch loop.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given total request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, WatchError> {
        debug!("GET {}", url);

        let fail = |source: anyhow::Error| WatchError::Fetch { url: url.to_string(), source };

        let response = self.client.get(url).send().await.map_err(|e| fail(e.into()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(fail(anyhow!("request failed with status {status}")));
        }

        response.text().await.map_err(|e| fail(e.into()))
    }
}
