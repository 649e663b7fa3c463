//! Default values for every configuration setting.

use super::settings::*;

// =============================================================================
// Cache
// =============================================================================

/// Default tile cache capacity (entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 96;

/// Default number of free raster buffers kept for reuse.
pub const DEFAULT_POOL_BUFFERS: usize = 64;

/// Default namespace for tile keys built from the command line.
pub const DEFAULT_NAMESPACE: &str = "default";

// =============================================================================
// Archive provider
// =============================================================================

pub const DEFAULT_ARCHIVE_THREADS: usize = 8;
pub const DEFAULT_ARCHIVE_QUEUE_SIZE: usize = 40;
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "png";
pub const DEFAULT_ARCHIVE_MIN_ZOOM: u8 = 0;
pub const DEFAULT_ARCHIVE_MAX_ZOOM: u8 = 22;

// =============================================================================
// Downloader provider
// =============================================================================

pub const DEFAULT_DOWNLOAD_THREADS: usize = 2;
pub const DEFAULT_DOWNLOAD_QUEUE_SIZE: usize = 40;
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DOWNLOAD_MIN_ZOOM: u8 = 0;
pub const DEFAULT_DOWNLOAD_MAX_ZOOM: u8 = 19;

/// Default attempts per tile (first try plus retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Hard ceiling on attempts per tile.
pub const MAX_ATTEMPTS_LIMIT: u32 = 5;

pub const DEFAULT_USER_AGENT: &str = concat!("tilepipe/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Logging
// =============================================================================

/// Log directory name, relative to the config directory.
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "tilepipe.log";

/// Clamp a configured attempt count to `1..=MAX_ATTEMPTS_LIMIT`.
pub(super) fn clamp_max_attempts(value: u32) -> u32 {
    if value == 0 || value > MAX_ATTEMPTS_LIMIT {
        let clamped = value.clamp(1, MAX_ATTEMPTS_LIMIT);
        tracing::warn!(
            requested = value,
            max = MAX_ATTEMPTS_LIMIT,
            "download max_attempts out of range, clamping to {}",
            clamped
        );
        clamped
    } else {
        value
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                capacity: DEFAULT_CACHE_CAPACITY,
                pool_buffers: DEFAULT_POOL_BUFFERS,
                namespace: DEFAULT_NAMESPACE.to_string(),
            },
            network: NetworkSettings {
                use_data_connection: true,
            },
            archive: ArchiveSettings {
                directory: None,
                extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
                max_age_secs: None,
                threads: DEFAULT_ARCHIVE_THREADS,
                queue_size: DEFAULT_ARCHIVE_QUEUE_SIZE,
                min_zoom: DEFAULT_ARCHIVE_MIN_ZOOM,
                max_zoom: DEFAULT_ARCHIVE_MAX_ZOOM,
            },
            download: DownloadSettings {
                url: None,
                mirrors: Vec::new(),
                threads: DEFAULT_DOWNLOAD_THREADS,
                queue_size: DEFAULT_DOWNLOAD_QUEUE_SIZE,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                min_zoom: DEFAULT_DOWNLOAD_MIN_ZOOM,
                max_zoom: DEFAULT_DOWNLOAD_MAX_ZOOM,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            logging: LoggingSettings {
                directory: super::file::config_directory().join(DEFAULT_LOG_DIRECTORY),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_max_attempts() {
        assert_eq!(clamp_max_attempts(0), 1);
        assert_eq!(clamp_max_attempts(3), 3);
        assert_eq!(clamp_max_attempts(5), 5);
        assert_eq!(clamp_max_attempts(50), MAX_ATTEMPTS_LIMIT);
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(DEFAULT_USER_AGENT.starts_with("tilepipe/"));
    }
}
