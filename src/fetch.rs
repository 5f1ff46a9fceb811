//! Shared HTTP access for every image source
//!
//! [`ImageFetcher`] owns the one `reqwest::Client` of a run (connection pool,
//! timeout, browser User-Agent) and the "download this URL into the image
//! directory" primitive all sources end with.

use crate::config::{AssetConfig, FetchConfig, RetryConfig};
use crate::error::{Result, StrategyError};
use crate::retry::with_retry;
use crate::utils::{asset_path, write_atomic};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// HTTP client plus image directory
#[derive(Clone, Debug)]
pub struct ImageFetcher {
    client: reqwest::Client,
    image_dir: PathBuf,
    extension: String,
    retry: RetryConfig,
}

impl ImageFetcher {
    /// Build the client from configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(fetch: &FetchConfig, assets: &AssetConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch.request_timeout)
            .connect_timeout(fetch.request_timeout)
            .user_agent(fetch.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            image_dir: assets.image_dir.clone(),
            extension: assets.image_extension.clone(),
            retry: fetch.retry.clone(),
        })
    }

    /// Directory images are written to
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Path an image named `stem` is written to
    pub fn target_path(&self, stem: &str) -> std::result::Result<PathBuf, StrategyError> {
        asset_path(&self.image_dir, stem, &self.extension).ok_or_else(|| StrategyError::Io {
            path: self.image_dir.join(stem),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "name cannot be used as a file name",
            ),
        })
    }

    /// Download `url` and store it as `<image_dir>/<stem>.<ext>`
    ///
    /// Returns the written path only once the file is complete and flushed.
    /// Nothing is left on disk when this fails.
    pub async fn save_image(
        &self,
        stem: &str,
        url: &str,
    ) -> std::result::Result<PathBuf, StrategyError> {
        let path = self.target_path(stem)?;

        let response = self.get(url, &[]).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StrategyError::from_reqwest(url, e))?;
        if bytes.is_empty() {
            return Err(StrategyError::NotFound(format!("empty body from {}", url)));
        }

        write_atomic(&path, &bytes)
            .await
            .map_err(|source| StrategyError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(url, path = %path.display(), bytes = bytes.len(), "saved image");
        Ok(path)
    }

    /// GET `url` and return the body as text
    pub async fn get_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<String, StrategyError> {
        self.get(url, headers)
            .await?
            .text()
            .await
            .map_err(|e| StrategyError::from_reqwest(url, e))
    }

    /// GET `url` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, StrategyError> {
        let body = self.get_text(url, headers).await?;
        serde_json::from_str(&body)
            .map_err(|e| StrategyError::parse(url, format!("invalid JSON: {}", e)))
    }

    /// Send a GET with retry of transient failures; non-2xx is an error
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<reqwest::Response, StrategyError> {
        with_retry(&self.retry, || async move {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StrategyError::from_reqwest(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(StrategyError::bad_status(url, status));
            }
            Ok(response)
        })
        .await
    }
}
