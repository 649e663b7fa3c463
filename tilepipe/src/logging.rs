//! Logging setup for tilepipe binaries.
//!
//! Installs a global `tracing` subscriber writing to both a log file
//! (truncated at startup) and stdout. `RUST_LOG` controls the filter and
//! defaults to `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Keeps the file writer alive. Dropping it flushes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// Path of the log file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Initialise logging from the `[logging]` settings.
///
/// # Errors
///
/// Fails if the log directory cannot be created, the log file cannot be
/// truncated, or a global subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> io::Result<LoggingGuard> {
    let path = prepare_log_file(&settings.directory, &settings.file)?;

    let file_appender = tracing_appender::rolling::never(&settings.directory, &settings.file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}

/// Create the log directory and truncate the log file.
fn prepare_log_file(dir: &Path, file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file);
    fs::write(&path, "")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs");

        let path = prepare_log_file(&dir, "test.log").unwrap();
        assert!(dir.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_clears_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.log");
        fs::write(&path, "old log data").unwrap();

        prepare_log_file(temp.path(), "test.log").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
