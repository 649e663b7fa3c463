//! Logger implementations.

use crate::log::{LogLevel, Logger};
use parking_lot::Mutex;
use std::fmt::Arguments;

/// Logger that forwards to the `tracing` ecosystem.
///
/// Every record carries a `component` field so the subscriber output shows
/// which part of the pipeline produced it (`layer`, `worker`, `cli`, ...).
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    /// Create a logger tagged with `component`.
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("tilepipe")
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(component = self.component, "{}", args),
            LogLevel::Debug => tracing::debug!(component = self.component, "{}", args),
            LogLevel::Info => tracing::info!(component = self.component, "{}", args),
            LogLevel::Warn => tracing::warn!(component = self.component, "{}", args),
            LogLevel::Error => tracing::error!(component = self.component, "{}", args),
        }
    }
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Logger that keeps rendered records in memory.
///
/// Handy for asserting that a fail-over or a drained queue was reported.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in arrival order.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    /// Whether any record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.records.lock().push((level, args.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_loggers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TracingLogger>();
        assert_send_sync::<NoOpLogger>();
        assert_send_sync::<MemoryLogger>();
    }

    #[test]
    fn test_tracing_logger_component() {
        assert_eq!(TracingLogger::new("worker").component(), "worker");
        assert_eq!(TracingLogger::default().component(), "tilepipe");

        // No subscriber installed: must not panic.
        let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("layer"));
        logger.info(format_args!("dispatching {}", "5/3/3"));
    }

    #[test]
    fn test_noop_logger_as_trait_object() {
        let logger: Box<dyn Logger> = Box::new(NoOpLogger);
        logger.warn(format_args!("dropped"));
    }

    #[test]
    fn test_memory_logger_contains_and_clear() {
        let logger = MemoryLogger::new();
        crate::log_warn!(logger, "queue full for {}", "downloader");

        assert!(logger.contains(LogLevel::Warn, "queue full"));
        assert!(!logger.contains(LogLevel::Error, "queue full"));

        logger.clear();
        assert!(logger.records().is_empty());
    }
}
