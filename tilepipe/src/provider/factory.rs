//! Provider factory: builds the provider chain from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use super::archive::{ArchiveProvider, DirectoryArchive};
use super::downloader::DownloaderProvider;
use super::http::ReqwestClient;
use super::types::{ProviderError, TileProvider};
use crate::config::{ArchiveConfig, ConfigFile, DownloadConfig};

/// Configuration for one provider in the chain.
///
/// # Example
///
/// ```
/// use tilepipe::config::{ArchiveConfig, DownloadConfig};
/// use tilepipe::provider::ProviderConfig;
///
/// let chain = vec![
///     ProviderConfig::Archive {
///         directory: "/srv/tiles".into(),
///         extension: "png".to_string(),
///         config: ArchiveConfig::new(),
///     },
///     ProviderConfig::Download(DownloadConfig::new("https://tile.example.org/{z}/{x}/{y}.png")),
/// ];
/// assert_eq!(chain[1].name(), "downloader");
/// ```
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// Tiles read from `directory/namespace/z/x/y.extension`.
    Archive {
        directory: PathBuf,
        extension: String,
        config: ArchiveConfig,
    },

    /// Tiles downloaded over HTTP.
    Download(DownloadConfig),
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Archive { .. } => "archive",
            ProviderConfig::Download(_) => "downloader",
        }
    }

    /// The chain described by a config file: the archive (if a directory is
    /// set) followed by the downloader (if a URL template is set).
    pub fn chain_from_config_file(config: &ConfigFile) -> Vec<ProviderConfig> {
        let mut chain = Vec::new();
        if let Some((directory, extension)) = ArchiveConfig::directory_from_config_file(config) {
            chain.push(ProviderConfig::Archive {
                directory,
                extension,
                config: ArchiveConfig::from(config),
            });
        }
        if let Some(download) = DownloadConfig::from_config_file(config) {
            chain.push(ProviderConfig::Download(download));
        }
        chain
    }
}

/// Creates providers from [`ProviderConfig`] values.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn TileProvider>, ProviderError> {
        match config {
            ProviderConfig::Archive {
                directory,
                extension,
                config,
            } => Ok(Arc::new(ArchiveProvider::new(
                DirectoryArchive::new(directory.clone(), extension.clone()),
                config.clone(),
            ))),
            ProviderConfig::Download(download) => {
                let client = ReqwestClient::from_config(download)?;
                Ok(Arc::new(DownloaderProvider::new(client, download.clone())))
            }
        }
    }

    pub fn create_all(
        &self,
        configs: &[ProviderConfig],
    ) -> Result<Vec<Arc<dyn TileProvider>>, ProviderError> {
        configs.iter().map(|c| self.create(c)).collect()
    }

    /// Build the chain described by `config`, in priority order.
    pub fn from_config_file(
        &self,
        config: &ConfigFile,
    ) -> Result<Vec<Arc<dyn TileProvider>>, ProviderError> {
        self.create_all(&ProviderConfig::chain_from_config_file(config))
    }
}
