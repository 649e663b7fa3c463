//! Archive provider configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use super::settings::ConfigFile;

/// Configuration for an [`ArchiveProvider`](crate::provider::ArchiveProvider).
///
/// ```
/// use std::time::Duration;
/// use tilepipe::config::ArchiveConfig;
///
/// let config = ArchiveConfig::new().with_max_age(Duration::from_secs(86_400));
/// assert_eq!(config.threads(), 8);
/// assert_eq!(config.max_age(), Some(Duration::from_secs(86_400)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Archived tiles older than this are reported as expired
    max_age: Option<Duration>,
    threads: usize,
    queue_size: usize,
    min_zoom: u8,
    max_zoom: u8,
}

impl ArchiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root directory and extension from `[archive]`, when a directory is set.
    pub fn directory_from_config_file(config: &ConfigFile) -> Option<(PathBuf, String)> {
        config
            .archive
            .directory
            .clone()
            .map(|dir| (dir, config.archive.extension.clone()))
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

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

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
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
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_age: None,
            threads: DEFAULT_ARCHIVE_THREADS,
            queue_size: DEFAULT_ARCHIVE_QUEUE_SIZE,
            min_zoom: DEFAULT_ARCHIVE_MIN_ZOOM,
            max_zoom: DEFAULT_ARCHIVE_MAX_ZOOM,
        }
    }
}

impl From<&ConfigFile> for ArchiveConfig {
    fn from(config: &ConfigFile) -> Self {
        let settings = &config.archive;
        let mut archive = Self::new()
            .with_threads(settings.threads)
            .with_queue_size(settings.queue_size)
            .with_zoom_range(settings.min_zoom, settings.max_zoom);
        if let Some(secs) = settings.max_age_secs {
            archive = archive.with_max_age(Duration::from_secs(secs));
        }
        archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.archive.max_age_secs = Some(120);
        file.archive.max_zoom = 14;

        let config = ArchiveConfig::from(&file);
        assert_eq!(config.max_age(), Some(Duration::from_secs(120)));
        assert_eq!(config.max_zoom(), 14);
        assert_eq!(config.queue_size(), DEFAULT_ARCHIVE_QUEUE_SIZE);
    }

    #[test]
    fn test_directory_from_config_file() {
        let mut file = ConfigFile::default();
        assert!(ArchiveConfig::directory_from_config_file(&file).is_none());

        file.archive.directory = Some(PathBuf::from("/tiles"));
        let (dir, ext) = ArchiveConfig::directory_from_config_file(&file).unwrap();
        assert_eq!(dir, PathBuf::from("/tiles"));
        assert_eq!(ext, "png");
    }
}
