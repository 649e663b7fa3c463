//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use tilepipe::config::ConfigFileError;
use tilepipe::layer::LayerError;
use tilepipe::provider::ProviderError;
use tilepipe::tile::TileKey;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// A provider could not be created
    Provider(ProviderError),
    /// The tile layer could not be started
    Layer(LayerError),
    /// Every provider failed for the tile
    TileFailed(TileKey),
    /// No answer within the timeout
    Timeout { tile: TileKey, waited: Duration },
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Print the error and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) | CliError::TileFailed(_) => {
                eprintln!();
                eprintln!("Check the provider settings with: tilepipe config show");
                eprintln!("  [archive] directory  - local tiles, laid out as <dir>/<namespace>/<z>/<x>/<y>.<ext>");
                eprintln!("  [download] url       - URL template, e.g. https://tile.example.org/{{z}}/{{x}}/{{y}}.png");
            }
            CliError::Timeout { .. } => {
                eprintln!();
                eprintln!("Try a longer --timeout, or --offline to use only the local archive.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Provider(e) => write!(f, "Failed to create provider: {}", e),
            CliError::Layer(e) => write!(f, "Failed to start tile layer: {}", e),
            CliError::TileFailed(tile) => write!(f, "No provider could supply tile {}", tile),
            CliError::Timeout { tile, waited } => {
                write!(f, "Timed out after {:?} waiting for tile {}", waited, tile)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Layer(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<LayerError> for CliError {
    fn from(e: LayerError) -> Self {
        CliError::Layer(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let tile = TileKey::new("osm", 3, 1, 2);
        assert_eq!(
            CliError::TileFailed(tile.clone()).to_string(),
            "No provider could supply tile osm/3/1/2"
        );
        assert!(CliError::Timeout {
            tile,
            waited: Duration::from_secs(2)
        }
        .to_string()
        .starts_with("Timed out after 2s"));
    }

    #[test]
    fn test_from_provider_error() {
        let err: CliError = ProviderError::NotFound.into();
        assert!(matches!(err, CliError::Provider(ProviderError::NotFound)));
    }
}
