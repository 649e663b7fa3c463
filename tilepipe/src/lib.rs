//! tilepipe - tile request and cache pipeline for map clients
//!
//! A bounded in-memory LRU cache of decoded map tiles in front of an ordered
//! chain of tile providers (a local archive, then the network). Lookups never
//! block: a miss starts an asynchronous fetch that walks the chain until a
//! provider delivers, and a listener is told when the tile arrives.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilepipe::config::{ConfigFile, LayerConfig};
//! use tilepipe::layer::{TileEvent, TileLayer};
//! use tilepipe::log::TracingLogger;
//! use tilepipe::provider::ProviderFactory;
//! use tilepipe::tile::{ImageTileDecoder, TileKey};
//!
//! let config = ConfigFile::load()?;
//! let providers = ProviderFactory::new().from_config_file(&config)?;
//! let layer = TileLayer::new(
//!     LayerConfig::from(&config),
//!     providers,
//!     Arc::new(ImageTileDecoder),
//!     Arc::new(TracingLogger::default()),
//! )?;
//!
//! layer.set_listener(|event: TileEvent| println!("{event}"));
//! let tile = layer.get_tile(&TileKey::new("osm", 12, 2154, 1363));
//! ```

pub mod cache;
pub mod chain;
pub mod config;
pub mod layer;
pub mod log;
pub mod logging;
pub mod provider;
pub mod tile;
pub mod worker;

/// Version of the tilepipe library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
