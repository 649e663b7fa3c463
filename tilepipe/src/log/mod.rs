//! Logging seam for pipeline components.
//!
//! The coordinator, the provider worker pools and the CLI all log through the
//! [`Logger`] trait instead of calling `tracing` directly. Production code
//! plugs in [`TracingLogger`]; tests use [`NoOpLogger`] to stay quiet or
//! [`MemoryLogger`] to assert on what was reported.
//!
//! ```
//! use tilepipe::log::{Logger, MemoryLogger, LogLevel};
//! use tilepipe::log_warn;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(MemoryLogger::new());
//! log_warn!(logger, "provider {} rejected tile", "archive");
//! assert!(logger.contains(LogLevel::Warn, "rejected tile"));
//! ```

mod adapters;

pub use adapters::{MemoryLogger, NoOpLogger, TracingLogger};

use std::fmt::Arguments;

/// Severity of a log record, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lower-case label used in rendered records.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging interface shared by every pipeline component.
///
/// Implementations must be `Send + Sync`: a single logger is shared between
/// the caller threads, the coordinator's event thread and every provider
/// worker.
pub trait Logger: Send + Sync {
    /// Record a message at `level`.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}
