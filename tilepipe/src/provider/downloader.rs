//! Network tile provider driven by a URL template.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use super::http::HttpClient;
use super::types::{FetchedTile, ProviderError, TileProvider};
use crate::config::DownloadConfig;
use crate::tile::TileKey;

/// Downloads tiles over HTTP.
///
/// The URL template accepts `{z}`, `{x}`, `{y}`, `{quadkey}` and `{s}`; `{s}`
/// takes the next mirror in round-robin order on every attempt. A fetch makes
/// at most `max_attempts` attempts:
///
/// - transient errors retry against the next mirror,
/// - a non-success status ends the fetch without retrying,
/// - an unreachable host returns [`ProviderError::CantContinue`].
///
/// # Example
///
/// ```
/// use tilepipe::config::DownloadConfig;
/// use tilepipe::provider::{DownloaderProvider, ReqwestClient, TileProvider};
///
/// let config = DownloadConfig::new("https://{s}.tile.example.org/{z}/{x}/{y}.png")
///     .with_mirrors(["a", "b", "c"]);
/// let client = ReqwestClient::from_config(&config).unwrap();
/// let provider = DownloaderProvider::new(client, config);
/// assert!(provider.requires_network());
/// ```
pub struct DownloaderProvider<C: HttpClient> {
    http_client: C,
    config: DownloadConfig,
    next_mirror: AtomicUsize,
}

impl<C: HttpClient> DownloaderProvider<C> {
    pub fn new(http_client: C, config: DownloadConfig) -> Self {
        Self {
            http_client,
            config,
            next_mirror: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn http_client(&self) -> &C {
        &self.http_client
    }

    /// URL for `key` using `mirror` for `{s}`.
    pub fn build_url(&self, key: &TileKey, mirror: &str) -> String {
        let template = self.config.url_template();
        let mut url = template
            .replace("{z}", &key.zoom().to_string())
            .replace("{x}", &key.x().to_string())
            .replace("{y}", &key.y().to_string())
            .replace("{s}", mirror);
        if template.contains("{quadkey}") {
            url = url.replace("{quadkey}", &key.quadkey());
        }
        url
    }

    fn next_mirror(&self) -> &str {
        let mirrors = self.config.mirrors();
        if mirrors.is_empty() {
            return "";
        }
        let index = self.next_mirror.fetch_add(1, Ordering::Relaxed) % mirrors.len();
        &mirrors[index]
    }
}

impl<C: HttpClient> TileProvider for DownloaderProvider<C> {
    fn name(&self) -> &str {
        "downloader"
    }

    fn fetch_tile(&self, key: &TileKey) -> Result<FetchedTile, ProviderError> {
        if !self.supports_zoom(key.zoom()) {
            return Err(ProviderError::UnsupportedZoom(key.zoom()));
        }
        let attempts = self.config.max_attempts();
        let mut last_error = ProviderError::NotFound;

        for attempt in 1..=attempts {
            let url = self.build_url(key, self.next_mirror());
            match self.http_client.get(&url) {
                Ok(bytes) if bytes.is_empty() => {
                    debug!(tile = %key, url = %url, "Empty response body");
                    return Err(ProviderError::NotFound);
                }
                Ok(bytes) => {
                    debug!(tile = %key, url = %url, attempt, size = bytes.len(), "Downloaded tile");
                    return Ok(FetchedTile::fresh(bytes));
                }
                Err(ProviderError::Unreachable(reason)) => {
                    warn!(url = %url, reason = %reason, "Tile server unreachable");
                    return Err(ProviderError::CantContinue(reason));
                }
                Err(e) if e.is_transient() => {
                    debug!(
                        tile = %key,
                        url = %url,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Download attempt failed, retrying"
                    );
                    last_error = e;
                }
                Err(e) => {
                    debug!(tile = %key, url = %url, error = %e, "Download failed");
                    return Err(e);
                }
            }
        }

        Err(last_error)
    }

    fn min_zoom(&self) -> u8 {
        self.config.min_zoom()
    }

    fn max_zoom(&self) -> u8 {
        self.config.max_zoom()
    }

    fn requires_network(&self) -> bool {
        true
    }

    fn worker_threads(&self) -> usize {
        self.config.threads()
    }

    fn max_queue_size(&self) -> usize {
        self.config.queue_size()
    }
}
