//! Loading and saving `~/.tilepipe/config.ini`.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load from `~/.tilepipe/config.ini`, falling back to defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// The INI document `save_to` would write.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Save to `~/.tilepipe/config.ini`.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }
}

/// The config directory (`~/.tilepipe`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilepipe")
}

/// The config file (`~/.tilepipe/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.cache.capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.capacity = 200;
        config.network.use_data_connection = false;
        config.archive.directory = Some(temp.path().join("tiles"));
        config.archive.max_age_secs = Some(3600);
        config.download.url = Some("https://{s}.example.org/{z}/{x}/{y}.png".to_string());
        config.download.mirrors = vec!["a".to_string(), "b".to_string()];
        config.download.max_attempts = 4;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_path_is_under_directory() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(config_file_path().ends_with("config.ini"));
    }
}
