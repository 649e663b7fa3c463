use std::time::Duration;

use super::defaults::{DEFAULT_CACHE_CAPACITY, DEFAULT_POOL_BUFFERS};
use super::settings::ConfigFile;

/// Settings for a [`TileLayer`](crate::layer::TileLayer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerConfig {
    capacity: usize,
    pool_buffers: usize,
    use_network: bool,
    shutdown_timeout: Duration,
}

impl LayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of tiles held by the cache.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Free raster buffers the pool keeps for reuse.
    pub fn with_pool_buffers(mut self, buffers: usize) -> Self {
        self.pool_buffers = buffers;
        self
    }

    /// Initial value of the use-network flag.
    pub fn with_use_network(mut self, use_network: bool) -> Self {
        self.use_network = use_network;
        self
    }

    /// How long dropping a layer waits for its event thread.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pool_buffers(&self) -> usize {
        self.pool_buffers
    }

    pub fn use_network(&self) -> bool {
        self.use_network
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            pool_buffers: DEFAULT_POOL_BUFFERS,
            use_network: true,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl From<&ConfigFile> for LayerConfig {
    fn from(config: &ConfigFile) -> Self {
        Self::new()
            .with_capacity(config.cache.capacity)
            .with_pool_buffers(config.cache.pool_buffers)
            .with_use_network(config.network.use_data_connection)
    }
}
