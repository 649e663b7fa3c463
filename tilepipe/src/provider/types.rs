//! Provider types and traits

use thiserror::Error;

use crate::tile::TileKey;

/// Errors that can occur while a provider fetches a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The source has no tile for this key
    #[error("Tile not found")]
    NotFound,

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Request failed in a way that may succeed on retry
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote host could not be reached at all
    #[error("Host unreachable: {0}")]
    Unreachable(String),

    /// Fetched bytes could not be turned into a raster
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Zoom level not supported by this provider
    #[error("Zoom level {0} not supported by provider")]
    UnsupportedZoom(u8),

    /// The provider's pending queue is full
    #[error("Provider queue full ({0} pending)")]
    QueueFull(usize),

    /// The provider cannot serve any further requests
    #[error("Provider cannot continue: {0}")]
    CantContinue(String),

    /// The provider was shut down before the request ran
    #[error("Provider detached")]
    Detached,
}

impl ProviderError {
    /// Errors worth retrying against the same source.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Http(_))
    }

    /// Errors after which the provider should drop its pending work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::CantContinue(_))
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        ProviderError::Io(e.to_string())
    }
}

/// Bytes returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTile {
    pub bytes: Vec<u8>,
    /// The source's copy is stale; a newer one should be sought.
    pub expired: bool,
}

impl FetchedTile {
    pub fn fresh(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            expired: false,
        }
    }

    pub fn expired(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            expired: true,
        }
    }
}

/// A source of tiles (local archive, network downloader, ...).
///
/// `fetch_tile` blocks; the layer runs it on the provider's own worker
/// threads, never on the caller's.
pub trait TileProvider: Send + Sync {
    /// Name for logging and identification.
    fn name(&self) -> &str;

    /// Fetch the encoded tile for `key`.
    fn fetch_tile(&self, key: &TileKey) -> Result<FetchedTile, ProviderError>;

    fn min_zoom(&self) -> u8;

    fn max_zoom(&self) -> u8;

    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }

    /// Whether fetching needs the data connection.
    fn requires_network(&self) -> bool;

    /// False once the provider can no longer serve requests.
    fn still_valid(&self) -> bool {
        true
    }

    /// Worker threads the layer should run for this provider.
    fn worker_threads(&self) -> usize {
        1
    }

    /// Bound on requests waiting for a worker.
    fn max_queue_size(&self) -> usize {
        crate::config::DEFAULT_DOWNLOAD_QUEUE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ProviderError::Http("reset".into()).is_transient());
        assert!(!ProviderError::NotFound.is_transient());
        assert!(!ProviderError::Unreachable("x".into()).is_transient());
        assert!(ProviderError::CantContinue("x".into()).is_fatal());
        assert!(!ProviderError::QueueFull(40).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::HttpStatus {
            status: 404,
            url: "http://t/1/2/3".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from http://t/1/2/3");
        assert_eq!(
            ProviderError::UnsupportedZoom(25).to_string(),
            "Zoom level 25 not supported by provider"
        );
    }

    struct Fixed;

    impl TileProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn fetch_tile(&self, _key: &TileKey) -> Result<FetchedTile, ProviderError> {
            Ok(FetchedTile::fresh(vec![1]))
        }
        fn min_zoom(&self) -> u8 {
            2
        }
        fn max_zoom(&self) -> u8 {
            4
        }
        fn requires_network(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_supports_zoom_default() {
        let p = Fixed;
        assert!(!p.supports_zoom(1));
        assert!(p.supports_zoom(2));
        assert!(p.supports_zoom(4));
        assert!(!p.supports_zoom(5));
        assert!(p.still_valid());
        assert_eq!(p.worker_threads(), 1);
    }
}
