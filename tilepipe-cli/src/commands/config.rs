//! Configuration management CLI commands.

use std::path::Path;

use clap::Subcommand;
use tilepipe::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Show => run_show(config_path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    print!("{}", config.to_ini_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        run(ConfigCommands::Init { force: false }, Some(path.as_path())).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[cache]\ncapacity = 5\n").unwrap();

        let err = run(ConfigCommands::Init { force: false }, Some(path.as_path())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(ConfigFile::load_from(&path).unwrap().cache.capacity, 5);

        run(ConfigCommands::Init { force: true }, Some(path.as_path())).unwrap();
        assert_eq!(
            ConfigFile::load_from(&path).unwrap().cache.capacity,
            ConfigFile::default().cache.capacity
        );
    }

    #[test]
    fn test_show_reports_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[download]\nthreads = zero\n").unwrap();

        assert!(matches!(
            run(ConfigCommands::Show, Some(path.as_path())),
            Err(CliError::ConfigFile(_))
        ));
    }
}
