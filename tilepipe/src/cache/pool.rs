//! Recycling pool for raster buffers.

use crate::tile::Raster;
use parking_lot::Mutex;
use std::sync::Arc;

/// Counters for a [`RasterPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers accepted back into the pool
    pub recycled: u64,
    /// Buffers handed out again by `acquire`
    pub reused: u64,
    /// Buffers freed because the pool was full
    pub discarded: u64,
    /// Rasters waiting for their last holder to release them
    pub deferred: usize,
}

#[derive(Default)]
struct PoolState {
    free: Vec<Vec<u8>>,
    deferred: Vec<Arc<Raster>>,
    stats: PoolStats,
}

/// Pool of reusable raster buffers.
///
/// Constructed explicitly and shared by `Arc` between the cache (which
/// returns evicted rasters) and the decoders (which draw new buffers).
///
/// A raster that is still referenced elsewhere when it is reclaimed, e.g. by a
/// renderer mid-draw, is parked instead of recycled; [`collect_deferred`]
/// later recycles the ones whose holders have let go.
///
/// [`collect_deferred`]: RasterPool::collect_deferred
pub struct RasterPool {
    state: Mutex<PoolState>,
    max_buffers: usize,
}

impl RasterPool {
    /// Create a pool retaining at most `max_buffers` free buffers.
    pub fn new(max_buffers: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            max_buffers,
        }
    }

    /// Take an empty buffer with capacity for at least `min_len` bytes.
    pub fn acquire(&self, min_len: usize) -> Vec<u8> {
        let mut state = self.state.lock();
        if let Some(pos) = state.free.iter().position(|b| b.capacity() >= min_len) {
            let mut buffer = state.free.swap_remove(pos);
            buffer.clear();
            state.stats.reused += 1;
            return buffer;
        }
        drop(state);
        Vec::with_capacity(min_len)
    }

    /// Return a buffer for reuse.
    pub fn recycle(&self, buffer: Vec<u8>) {
        if buffer.capacity() == 0 {
            return;
        }
        let mut state = self.state.lock();
        if state.free.len() >= self.max_buffers {
            state.stats.discarded += 1;
            return;
        }
        state.free.push(buffer);
        state.stats.recycled += 1;
    }

    /// Reclaim a raster removed from the cache.
    ///
    /// Returns `true` if its buffer was recycled immediately, `false` if it is
    /// still held elsewhere and was parked.
    pub fn reclaim(&self, raster: Arc<Raster>) -> bool {
        match Arc::try_unwrap(raster) {
            Ok(raster) => {
                self.recycle(raster.into_data());
                true
            }
            Err(shared) => {
                let mut state = self.state.lock();
                // Parking the same raster twice would keep it pinned forever.
                if !state.deferred.iter().any(|r| Arc::ptr_eq(r, &shared)) {
                    state.deferred.push(shared);
                }
                false
            }
        }
    }

    /// Recycle parked rasters nobody holds any more. Returns how many.
    pub fn collect_deferred(&self) -> usize {
        let released = {
            let mut state = self.state.lock();
            if state.deferred.is_empty() {
                return 0;
            }
            let parked = std::mem::take(&mut state.deferred);
            let (released, still_held): (Vec<_>, Vec<_>) =
                parked.into_iter().partition(|r| Arc::strong_count(r) == 1);
            state.deferred = still_held;
            released
        };

        let count = released.len();
        for raster in released {
            if let Ok(raster) = Arc::try_unwrap(raster) {
                self.recycle(raster.into_data());
            }
        }
        count
    }

    pub fn free_buffers(&self) -> usize {
        self.state.lock().free.len()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            deferred: state.deferred.len(),
            ..state.stats
        }
    }
}

impl Default for RasterPool {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POOL_BUFFERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_fresh_buffer() {
        let pool = RasterPool::new(2);
        let buffer = pool.acquire(128);
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 128);
        assert_eq!(pool.stats().reused, 0);
    }

    #[test]
    fn test_recycled_buffer_is_reused_and_cleared() {
        let pool = RasterPool::new(2);
        pool.recycle(vec![7; 256]);

        let buffer = pool.acquire(100);
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 256);
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.free_buffers(), 0);
    }

    #[test]
    fn test_too_small_buffer_not_reused() {
        let pool = RasterPool::new(2);
        pool.recycle(Vec::with_capacity(16));

        let _ = pool.acquire(1024);
        assert_eq!(pool.stats().reused, 0);
        assert_eq!(pool.free_buffers(), 1);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = RasterPool::new(1);
        pool.recycle(vec![0; 8]);
        pool.recycle(vec![0; 8]);

        let stats = pool.stats();
        assert_eq!(stats.recycled, 1);
        assert_eq!(stats.discarded, 1);
        assert_eq!(pool.free_buffers(), 1);
    }

    #[test]
    fn test_reclaim_unshared_raster_recycles_now() {
        let pool = RasterPool::new(4);
        let raster = Arc::new(Raster::encoded(vec![1, 2, 3]));

        assert!(pool.reclaim(raster));
        assert_eq!(pool.free_buffers(), 1);
        assert_eq!(pool.stats().deferred, 0);
    }

    #[test]
    fn test_reclaim_held_raster_is_deferred_until_released() {
        let pool = RasterPool::new(4);
        let raster = Arc::new(Raster::encoded(vec![1, 2, 3]));
        let renderer_handle = Arc::clone(&raster);

        assert!(!pool.reclaim(raster));
        assert_eq!(pool.stats().deferred, 1);
        assert_eq!(pool.collect_deferred(), 0);
        assert_eq!(pool.free_buffers(), 0);

        drop(renderer_handle);
        assert_eq!(pool.collect_deferred(), 1);
        assert_eq!(pool.free_buffers(), 1);
        assert_eq!(pool.stats().deferred, 0);
    }

    #[test]
    fn test_reclaim_same_raster_twice_parks_once() {
        let pool = RasterPool::new(4);
        let raster = Arc::new(Raster::encoded(vec![1]));
        let held = Arc::clone(&raster);

        pool.reclaim(Arc::clone(&raster));
        pool.reclaim(raster);
        assert_eq!(pool.stats().deferred, 1);

        drop(held);
        assert_eq!(pool.collect_deferred(), 1);
    }
}
