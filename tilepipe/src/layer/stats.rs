use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request counters for a [`TileLayer`](super::TileLayer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerStats {
    /// Requests registered after a cache miss or expired hit
    pub requests: u64,
    /// Requests that ended with a fresh tile
    pub loaded: u64,
    /// Stale tiles shown while a request kept going
    pub expired: u64,
    /// Requests that ran out of providers
    pub failed: u64,
    /// Outcomes discarded because their request was gone
    pub stale: u64,
    /// Submissions a provider rejected (queue full or shut down)
    pub rejected: u64,
}

impl fmt::Display for LayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests: {} loaded, {} failed, {} expired, {} stale, {} rejected",
            self.requests, self.loaded, self.failed, self.expired, self.stale, self.rejected
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct LayerCounters {
    requests: AtomicU64,
    loaded: AtomicU64,
    expired: AtomicU64,
    failed: AtomicU64,
    stale: AtomicU64,
    rejected: AtomicU64,
}

impl LayerCounters {
    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn loaded(&self) {
        self.loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LayerStats {
        LayerStats {
            requests: self.requests.load(Ordering::Relaxed),
            loaded: self.loaded.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
