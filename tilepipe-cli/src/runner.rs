//! Shared setup for commands that run the pipeline.

use std::path::Path;
use std::sync::Arc;

use tilepipe::config::{ConfigFile, LayerConfig};
use tilepipe::layer::TileLayer;
use tilepipe::log::TracingLogger;
use tilepipe::logging::{init_logging, LoggingGuard};
use tilepipe::provider::ProviderFactory;
use tilepipe::tile::TileDecoder;
use tracing::info;

use crate::error::CliError;

/// Loaded config plus active logging.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config (from `path`, or the default location) and start logging.
    pub fn new(path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(path)?;
        let logging_guard =
            init_logging(&config.logging).map_err(|e| CliError::LoggingInit(e.to_string()))?;
        info!(
            version = tilepipe::VERSION,
            log = %logging_guard.path().display(),
            "tilepipe starting"
        );
        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Build a layer over the configured provider chain.
    pub fn create_layer(
        &self,
        layer_config: LayerConfig,
        decoder: Arc<dyn TileDecoder>,
    ) -> Result<TileLayer, CliError> {
        let providers = ProviderFactory::new().from_config_file(&self.config)?;
        if providers.is_empty() {
            return Err(CliError::Config(
                "no tile providers configured; set [archive] directory or [download] url".into(),
            ));
        }
        let layer = TileLayer::new(
            layer_config,
            providers,
            decoder,
            Arc::new(TracingLogger::new("tilepipe-cli")),
        )?;
        Ok(layer)
    }
}

/// Load from `path` when given, else from `~/.tilepipe/config.ini`.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}
