//! Downloader provider configuration.

use std::time::Duration;

use super::defaults::*;
use super::settings::ConfigFile;

/// Configuration for a [`DownloaderProvider`](crate::provider::DownloaderProvider).
///
/// # Example
///
/// ```
/// use tilepipe::config::DownloadConfig;
///
/// let config = DownloadConfig::new("https://{s}.tile.example.org/{z}/{x}/{y}.png")
///     .with_mirrors(["a", "b"])
///     .with_max_attempts(2)
///     .with_zoom_range(0, 16);
///
/// assert_eq!(config.max_attempts(), 2);
/// assert_eq!(config.timeout_secs(), 30);
/// assert_eq!(config.max_zoom(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// URL template with `{z}`, `{x}`, `{y}`, `{s}` and `{quadkey}` placeholders
    url_template: String,
    /// Values substituted for `{s}`
    mirrors: Vec<String>,
    /// Attempts per tile, including the first
    max_attempts: u32,
    /// Per-request timeout (seconds)
    timeout_secs: u64,
    threads: usize,
    queue_size: usize,
    min_zoom: u8,
    max_zoom: u8,
    user_agent: String,
}

impl DownloadConfig {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            mirrors: Vec::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            threads: DEFAULT_DOWNLOAD_THREADS,
            queue_size: DEFAULT_DOWNLOAD_QUEUE_SIZE,
            min_zoom: DEFAULT_DOWNLOAD_MIN_ZOOM,
            max_zoom: DEFAULT_DOWNLOAD_MAX_ZOOM,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Build from `[download]`. `None` when no URL template is configured.
    pub fn from_config_file(config: &ConfigFile) -> Option<Self> {
        let settings = &config.download;
        let url = settings.url.as_ref()?;
        Some(
            Self::new(url.clone())
                .with_mirrors(settings.mirrors.iter().cloned())
                .with_max_attempts(settings.max_attempts)
                .with_timeout_secs(settings.timeout_secs)
                .with_threads(settings.threads)
                .with_queue_size(settings.queue_size)
                .with_zoom_range(settings.min_zoom, settings.max_zoom)
                .with_user_agent(settings.user_agent.clone()),
        )
    }

    pub fn with_mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    /// Set attempts per tile. Clamped to `1..=MAX_ATTEMPTS_LIMIT`.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = clamp_max_attempts(attempts);
        self
    }

    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    /// Worker threads for the provider's pool (at least one).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloadConfig::new("http://t/{z}/{x}/{y}");
        assert_eq!(config.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.threads(), DEFAULT_DOWNLOAD_THREADS);
        assert_eq!(config.queue_size(), DEFAULT_DOWNLOAD_QUEUE_SIZE);
        assert_eq!(config.max_zoom(), DEFAULT_DOWNLOAD_MAX_ZOOM);
        assert!(config.mirrors().is_empty());
    }

    #[test]
    fn test_max_attempts_clamped() {
        let config = DownloadConfig::new("u").with_max_attempts(12);
        assert_eq!(config.max_attempts(), MAX_ATTEMPTS_LIMIT);
        let config = DownloadConfig::new("u").with_max_attempts(0);
        assert_eq!(config.max_attempts(), 1);
    }

    #[test]
    fn test_threads_at_least_one() {
        assert_eq!(DownloadConfig::new("u").with_threads(0).threads(), 1);
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        assert!(DownloadConfig::from_config_file(&file).is_none());

        file.download.url = Some("https://{s}.example/{z}/{x}/{y}.png".to_string());
        file.download.mirrors = vec!["a".into(), "b".into()];
        file.download.timeout_secs = 5;

        let config = DownloadConfig::from_config_file(&file).unwrap();
        assert_eq!(config.url_template(), "https://{s}.example/{z}/{x}/{y}.png");
        assert_eq!(config.mirrors(), ["a".to_string(), "b".to_string()]);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }
}
