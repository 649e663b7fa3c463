//! Tile providers.
//!
//! A provider fetches encoded tile bytes for a [`TileKey`](crate::tile::TileKey).
//! The layer asks providers in priority order: typically a local
//! [`ArchiveProvider`] first, then a network [`DownloaderProvider`].
//!
//! ```ignore
//! use tilepipe::config::ConfigFile;
//! use tilepipe::provider::ProviderFactory;
//!
//! let config = ConfigFile::load()?;
//! let providers = ProviderFactory::new().from_config_file(&config)?;
//! ```

mod archive;
mod downloader;
mod factory;
mod http;
mod types;

pub use archive::{ArchiveProvider, ArchivedTile, DirectoryArchive, MemoryArchive, TileArchive};
pub use downloader::DownloaderProvider;
pub use factory::{ProviderConfig, ProviderFactory};
pub use http::{HttpClient, ReqwestClient};
pub use types::{FetchedTile, ProviderError, TileProvider};

#[cfg(test)]
pub use http::tests::MockHttpClient;
