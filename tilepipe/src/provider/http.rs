//! HTTP client abstraction for testability

use std::time::Duration;

use tracing::{debug, trace};

use super::types::ProviderError;
use crate::config::DownloadConfig;

/// Synchronous HTTP GET.
///
/// Lets the downloader run against a mock client in tests.
pub trait HttpClient: Send + Sync {
    /// Fetch `url` and return the body of a successful response.
    ///
    /// Connection failures map to [`ProviderError::Unreachable`], non-success
    /// statuses to [`ProviderError::HttpStatus`], anything else to
    /// [`ProviderError::Http`].
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Blocking reqwest client.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Client with the timeout and user agent of a download configuration.
    pub fn from_config(config: &DownloadConfig) -> Result<Self, ProviderError> {
        Self::new(config.timeout(), config.user_agent())
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        trace!(url = %url, "HTTP GET");

        let response = self.client.get(url).send().map_err(|e| {
            if e.is_connect() {
                ProviderError::Unreachable(e.to_string())
            } else {
                ProviderError::Http(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Non-success response");
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::Http(format!("Failed to read response: {}", e)))
    }
}
