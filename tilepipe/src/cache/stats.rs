//! Cache statistics.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one [`LruTileCache`](super::LruTileCache).
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries dropped by `remove`, `clear` or replacement
    pub removals: u64,
    pub entries: usize,
    pub capacity: usize,
    pub created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            insertions: 0,
            evictions: 0,
            removals: 0,
            entries: 0,
            capacity: 0,
            created_at: Instant::now(),
        }
    }

    /// Hit rate in `0.0..=1.0`; zero before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_insertion(&mut self) {
        self.insertions += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn record_removal(&mut self) {
        self.removals += 1;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} tiles, {} hits, {} misses ({:.1}% hit rate), {} evictions",
            self.entries,
            self.capacity,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions
        )
    }
}
