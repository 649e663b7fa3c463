//! The tile layer: cache front, request registry and provider chain.
//!
//! [`TileLayer::get_tile`] answers from the in-memory cache and, on a miss
//! or a stale hit, registers one request per key and hands it to the first
//! eligible provider. Providers run on their own worker threads and report
//! back over a channel; a single event thread applies each outcome:
//!
//! - fresh tile: cached, request removed, [`TileEvent::Loaded`]
//! - stale tile: cached as expired, [`TileEvent::Expired`], next provider
//! - failure: next eligible provider, or [`TileEvent::Failed`] when none is left
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tilepipe::config::LayerConfig;
//! use tilepipe::layer::{TileEvent, TileLayer};
//! use tilepipe::log::NoOpLogger;
//! use tilepipe::provider::{ArchiveProvider, MemoryArchive, TileProvider};
//! use tilepipe::config::ArchiveConfig;
//! use tilepipe::tile::{RawTileDecoder, TileKey};
//!
//! let archive = MemoryArchive::new();
//! archive.insert(TileKey::new("demo", 1, 0, 0), b"tile".to_vec());
//! let provider: Arc<dyn TileProvider> = Arc::new(ArchiveProvider::new(archive, ArchiveConfig::new()));
//!
//! let layer = TileLayer::new(
//!     LayerConfig::new(),
//!     vec![provider],
//!     Arc::new(RawTileDecoder),
//!     Arc::new(NoOpLogger),
//! )
//! .unwrap();
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! layer.set_listener(move |event: TileEvent| {
//!     let _ = tx.send(event);
//! });
//!
//! let key = TileKey::new("demo", 1, 0, 0);
//! assert!(layer.get_tile(&key).is_none());
//! let event = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
//! assert_eq!(event, TileEvent::Loaded(key.clone()));
//! assert_eq!(layer.get_tile(&key).unwrap().raster().data(), b"tile");
//! ```

mod coordinator;
mod events;
mod stats;

pub(crate) use events::LayerMessage;
pub use events::{TileEvent, TileListener};
pub use stats::LayerStats;

use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use thiserror::Error;

use self::coordinator::LayerInner;
use crate::cache::{CacheStats, LruTileCache, RasterPool};
use crate::config::LayerConfig;
use crate::log::Logger;
use crate::provider::TileProvider;
use crate::tile::{CachedTile, Raster, TileDecoder, TileKey};
use crate::worker::WorkerEnv;
use crate::{log_debug, log_info, log_warn};

/// Errors creating or reconfiguring a layer.
#[derive(Debug, Error)]
pub enum LayerError {
    /// A worker or event thread could not be started
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Tile cache and request coordinator.
///
/// All methods take `&self`; share a layer between threads with an `Arc`.
pub struct TileLayer {
    inner: Arc<LayerInner>,
    events: mpsc::Sender<LayerMessage>,
    event_thread: Mutex<Option<EventThread>>,
    config: LayerConfig,
}

/// The outcome thread, plus a channel that disconnects when it exits.
struct EventThread {
    handle: JoinHandle<()>,
    exited: mpsc::Receiver<()>,
}

impl TileLayer {
    /// Create a layer over `providers`, tried in the given order.
    pub fn new(
        config: LayerConfig,
        providers: Vec<Arc<dyn TileProvider>>,
        decoder: Arc<dyn TileDecoder>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, LayerError> {
        let raster_pool = Arc::new(RasterPool::new(config.pool_buffers()));
        let cache = LruTileCache::new(config.capacity(), Arc::clone(&raster_pool));
        let (events, receiver) = mpsc::channel();

        let env = WorkerEnv {
            decoder,
            raster_pool,
            events: events.clone(),
            logger: Arc::clone(&logger),
        };
        let inner = Arc::new(LayerInner::new(cache, config.use_network(), env));
        inner.set_providers(providers)?;

        let worker = Arc::clone(&inner);
        let (exit_signal, exited) = mpsc::channel::<()>();
        let event_thread = thread::Builder::new()
            .name("tile-layer-events".to_string())
            .spawn(move || {
                let _exit_signal = exit_signal;
                worker.run_events(receiver);
            });
        let event_thread = match event_thread {
            Ok(handle) => EventThread { handle, exited },
            Err(e) => {
                inner.detach();
                return Err(LayerError::Spawn(e));
            }
        };

        log_info!(
            logger,
            "Tile layer ready: {} cached tiles max, {} provider(s), network {}",
            config.capacity(),
            inner.providers.read().len(),
            if config.use_network() { "on" } else { "off" }
        );

        Ok(Self {
            inner,
            events,
            event_thread: Mutex::new(Some(event_thread)),
            config,
        })
    }

    /// Look up a tile without blocking.
    ///
    /// Returns the cached tile when there is one. A miss, or a hit that is
    /// marked expired, also starts a fetch unless one is already running for
    /// the key; the listener hears how it ends.
    pub fn get_tile(&self, key: &TileKey) -> Option<CachedTile> {
        self.inner.get_tile(key)
    }

    /// Register the listener for tile notifications, replacing any previous one.
    pub fn set_listener<L>(&self, listener: L)
    where
        L: TileListener + 'static,
    {
        *self.inner.listener.write() = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self.inner.listener.write() = None;
    }

    /// Grow the cache to hold at least `capacity` tiles. Never shrinks.
    pub fn set_capacity(&self, capacity: usize) {
        self.inner.cache.lock().ensure_capacity(capacity);
    }

    pub fn capacity(&self) -> usize {
        self.inner.cache.lock().capacity()
    }

    /// Allow or forbid providers that need the network.
    pub fn set_use_network(&self, use_network: bool) {
        self.inner.use_network.store(use_network, Ordering::Release);
        log_debug!(
            self.inner.env.logger,
            "Network providers {}",
            if use_network { "enabled" } else { "disabled" }
        );
    }

    pub fn use_network(&self) -> bool {
        self.inner.use_network.load(Ordering::Acquire)
    }

    /// Replace the provider chain.
    ///
    /// Requests already running skip providers that are no longer listed.
    pub fn set_providers(&self, providers: Vec<Arc<dyn TileProvider>>) -> Result<(), LayerError> {
        self.inner.set_providers(providers)?;
        Ok(())
    }

    /// Names of the active providers, in order.
    pub fn provider_names(&self) -> Vec<String> {
        self.inner
            .providers
            .read()
            .slots()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Cache `raster` as an expired stand-in for `key`.
    ///
    /// The next `get_tile` returns it and fetches a fresh copy; useful for
    /// showing a scaled lower-zoom tile while the real one loads.
    pub fn seed_expired(&self, key: TileKey, raster: Raster) {
        self.inner
            .cache
            .lock()
            .put(key, CachedTile::new(raster).into_expired());
    }

    /// Abandon all in-flight requests and stop every provider.
    ///
    /// Fetches already running finish but their results are dropped. Cached
    /// tiles stay readable; no new fetches start.
    pub fn detach(&self) {
        self.inner.detach();
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::Acquire)
    }

    /// Requests currently registered.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.inner.in_flight.lock().contains_key(key)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.lock().stats()
    }

    pub fn stats(&self) -> LayerStats {
        self.inner.counters.snapshot()
    }

    /// Drop every cached tile, returning rasters to the pool.
    pub fn clear_cache(&self) {
        self.inner.cache.lock().clear();
    }

    pub fn raster_pool(&self) -> &Arc<RasterPool> {
        &self.inner.env.raster_pool
    }
}

impl Drop for TileLayer {
    fn drop(&mut self) {
        self.inner.detach();
        let _ = self.events.send(LayerMessage::Shutdown);

        let Some(running) = self.event_thread.lock().take() else {
            return;
        };
        // Nothing is ever sent; the channel disconnects once the thread ends.
        let timeout = self.config.shutdown_timeout();
        if let Err(RecvTimeoutError::Timeout) = running.exited.recv_timeout(timeout) {
            log_warn!(
                self.inner.env.logger,
                "Event thread still busy after {:?}, not waiting",
                timeout
            );
            return;
        }
        let _ = running.handle.join();
    }
}
