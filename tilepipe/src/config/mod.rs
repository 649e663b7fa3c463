//! Configuration for the tile pipeline.
//!
//! Two layers, as elsewhere in the crate:
//!
//! - [`ConfigFile`]: the user-editable `~/.tilepipe/config.ini`, loaded with
//!   defaults for anything missing and validated on load.
//! - Component configs ([`LayerConfig`], [`DownloadConfig`],
//!   [`ArchiveConfig`]): small builder-style structs each component takes,
//!   derivable from a [`ConfigFile`].
//!
//! ```
//! use tilepipe::config::{DownloadConfig, LayerConfig};
//!
//! let layer = LayerConfig::new().with_capacity(128).with_use_network(false);
//! assert_eq!(layer.capacity(), 128);
//!
//! let download = DownloadConfig::new("https://{s}.tiles.example/{z}/{x}/{y}.png")
//!     .with_mirrors(["a", "b", "c"])
//!     .with_max_attempts(4);
//! assert_eq!(download.mirrors().len(), 3);
//! ```

mod archive;
mod defaults;
mod download;
mod file;
mod layer;
mod parser;
mod settings;
mod writer;

pub use archive::ArchiveConfig;
pub use defaults::*;
pub use download::DownloadConfig;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use layer::LayerConfig;
pub use settings::{
    ArchiveSettings, CacheSettings, ConfigFile, DownloadSettings, LoggingSettings,
    NetworkSettings,
};
