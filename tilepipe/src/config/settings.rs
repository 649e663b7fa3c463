//! Settings structs, one per `[section]` of `config.ini`.

use std::path::PathBuf;

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub network: NetworkSettings,
    pub archive: ArchiveSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of tiles held in memory
    pub capacity: usize,
    /// Free raster buffers kept for reuse
    pub pool_buffers: usize,
    /// Namespace used for tile keys (the tile source's cache key)
    pub namespace: String,
}

/// `[network]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Whether providers that need the network may be used
    pub use_data_connection: bool,
}

/// `[archive]` - local tile archive, consulted before the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    /// Archive root; the archive provider is disabled when unset
    pub directory: Option<PathBuf>,
    /// Tile file extension
    pub extension: String,
    /// Tiles older than this are served as expired
    pub max_age_secs: Option<u64>,
    pub threads: usize,
    pub queue_size: usize,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// `[download]` - network tile source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// URL template; the downloader is disabled when unset
    pub url: Option<String>,
    /// Values substituted for `{s}`, rotated between attempts
    pub mirrors: Vec<String>,
    pub threads: usize,
    pub queue_size: usize,
    /// Attempts per tile, including the first
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub user_agent: String,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
