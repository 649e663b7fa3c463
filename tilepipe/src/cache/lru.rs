//! Bounded, access-ordered tile cache.

use super::{CacheStats, RasterPool};
use crate::tile::{CachedTile, TileKey};
use lru::LruCache;
use std::sync::Arc;

/// Hook invoked with the key of every tile leaving the cache.
pub type RemovalListener = Box<dyn Fn(&TileKey) + Send + Sync>;

/// Least-recently-used tile cache bounded by entry count.
///
/// Every `get` and `put` moves the entry to the most-recently-used end. When
/// an insert pushes the cache over capacity, one entry is evicted: the eldest
/// tile nobody else holds, or the eldest overall if every tile is in use. The
/// evicted raster goes to the [`RasterPool`]; a raster still being drawn is
/// only recycled once its holder drops it.
///
/// The cache itself is not synchronised; the coordinator wraps it in a mutex.
///
/// # Example
///
/// ```
/// use tilepipe::cache::{LruTileCache, RasterPool};
/// use tilepipe::tile::{CachedTile, Raster, TileKey};
/// use std::sync::Arc;
///
/// let mut cache = LruTileCache::new(2, Arc::new(RasterPool::new(8)));
/// let a = TileKey::new("osm", 1, 0, 0);
/// let b = TileKey::new("osm", 1, 1, 0);
/// let c = TileKey::new("osm", 1, 0, 1);
///
/// cache.put(a.clone(), CachedTile::new(Raster::encoded(vec![1])));
/// cache.put(b.clone(), CachedTile::new(Raster::encoded(vec![2])));
/// cache.get(&a);
/// cache.put(c.clone(), CachedTile::new(Raster::encoded(vec![3])));
///
/// assert!(cache.contains_key(&a));
/// assert!(!cache.contains_key(&b));
/// ```
pub struct LruTileCache {
    entries: LruCache<TileKey, CachedTile>,
    capacity: usize,
    pool: Arc<RasterPool>,
    on_removed: Option<RemovalListener>,
    stats: CacheStats,
}

impl LruTileCache {
    /// Create a cache holding at most `capacity` tiles.
    ///
    /// A capacity of zero is accepted: every insert is evicted immediately.
    pub fn new(capacity: usize, pool: Arc<RasterPool>) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity,
            pool,
            on_removed: None,
            stats: CacheStats::new(),
        }
    }

    /// Register the hook called for every removed tile.
    pub fn set_removal_listener<F>(&mut self, listener: F)
    where
        F: Fn(&TileKey) + Send + Sync + 'static,
    {
        self.on_removed = Some(Box::new(listener));
    }

    /// Look up a tile and mark it most recently used.
    pub fn get(&mut self, key: &TileKey) -> Option<CachedTile> {
        match self.entries.get(key) {
            Some(tile) => {
                self.stats.record_hit();
                Some(tile.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Look up a tile without touching recency or statistics.
    pub fn peek(&self, key: &TileKey) -> Option<&CachedTile> {
        self.entries.peek(key)
    }

    pub fn contains_key(&self, key: &TileKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert or replace a tile, then evict down to capacity.
    pub fn put(&mut self, key: TileKey, tile: CachedTile) {
        let incoming = Arc::as_ptr(tile.shared_raster());
        if let Some(previous) = self.entries.put(key.clone(), tile) {
            // Re-inserting the same raster (e.g. flagging it expired) is not a removal.
            if Arc::as_ptr(previous.shared_raster()) != incoming {
                self.stats.record_removal();
                self.release(&key, previous);
            }
        }
        self.stats.record_insertion();

        while self.entries.len() > self.capacity {
            if !self.evict_one(&key) {
                break;
            }
        }
        self.pool.collect_deferred();
    }

    /// Remove a tile. Returns whether it was present.
    pub fn remove(&mut self, key: &TileKey) -> bool {
        match self.entries.pop(key) {
            Some(tile) => {
                self.stats.record_removal();
                self.release(key, tile);
                true
            }
            None => false,
        }
    }

    /// Remove every tile, one at a time, so each removal runs the hook and
    /// reaches the pool.
    pub fn clear(&mut self) {
        while let Some((key, tile)) = self.entries.pop_lru() {
            self.stats.record_removal();
            self.release(&key, tile);
        }
    }

    /// Grow the capacity to at least `capacity`. Never shrinks.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.capacity = capacity;
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pool(&self) -> &Arc<RasterPool> {
        &self.pool
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            ..self.stats.clone()
        }
    }

    /// Evict one entry, sparing `inserted` unless it is the only candidate.
    fn evict_one(&mut self, inserted: &TileKey) -> bool {
        // `iter()` walks from most to least recently used.
        let idle = self
            .entries
            .iter()
            .rev()
            .find(|(key, tile)| *key != inserted && !tile.is_in_use())
            .map(|(key, _)| key.clone());

        let victim = match idle {
            Some(key) => self.entries.pop(&key).map(|tile| (key, tile)),
            None => self.entries.pop_lru(),
        };

        match victim {
            Some((key, tile)) => {
                self.stats.record_eviction();
                self.release(&key, tile);
                true
            }
            None => false,
        }
    }

    fn release(&self, key: &TileKey, tile: CachedTile) {
        if let Some(listener) = &self.on_removed {
            listener(key);
        }
        self.pool.reclaim(tile.into_raster());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Raster;
    use parking_lot::Mutex;

    fn key(n: u32) -> TileKey {
        TileKey::new("test", 10, n, n)
    }

    fn tile(byte: u8) -> CachedTile {
        CachedTile::new(Raster::encoded(vec![byte; 16]))
    }

    fn cache(capacity: usize) -> LruTileCache {
        LruTileCache::new(capacity, Arc::new(RasterPool::new(16)))
    }

    #[test]
    fn test_get_miss_and_hit() {
        let mut cache = cache(4);
        assert!(cache.get(&key(1)).is_none());

        cache.put(key(1), tile(1));
        let hit = cache.get(&key(1)).unwrap();
        assert_eq!(hit.raster().data()[0], 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut cache = cache(3);
        for n in 0..20 {
            cache.put(key(n), tile(n as u8));
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 17);
    }

    #[test]
    fn test_first_inserted_is_evicted() {
        let capacity = 4;
        let mut cache = cache(capacity);
        for n in 0..=capacity as u32 {
            cache.put(key(n), tile(n as u8));
        }

        assert!(!cache.contains_key(&key(0)));
        for n in 1..=capacity as u32 {
            assert!(cache.contains_key(&key(n)));
        }
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = cache(2);
        cache.put(key(1), tile(1)); // A
        cache.put(key(2), tile(2)); // B
        cache.get(&key(1));
        cache.put(key(3), tile(3)); // C

        assert!(cache.contains_key(&key(1)));
        assert!(!cache.contains_key(&key(2)));
        assert!(cache.contains_key(&key(3)));
    }

    #[test]
    fn test_put_refreshes_recency() {
        let mut cache = cache(2);
        cache.put(key(1), tile(1));
        cache.put(key(2), tile(2));
        cache.put(key(1), tile(9));
        cache.put(key(3), tile(3));

        assert!(cache.contains_key(&key(1)));
        assert!(!cache.contains_key(&key(2)));
        assert_eq!(cache.peek(&key(1)).unwrap().raster().data()[0], 9);
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let mut cache = cache(2);
        cache.put(key(1), tile(1));
        cache.put(key(2), tile(2));
        assert!(cache.peek(&key(1)).is_some());
        cache.put(key(3), tile(3));

        assert!(!cache.contains_key(&key(1)));
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let mut cache = cache(0);
        cache.put(key(1), tile(1));

        assert!(cache.is_empty());
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn test_ensure_capacity_only_grows() {
        let mut cache = cache(4);
        cache.ensure_capacity(2);
        assert_eq!(cache.capacity(), 4);

        cache.ensure_capacity(10);
        assert_eq!(cache.capacity(), 10);
        for n in 0..10 {
            cache.put(key(n), tile(n as u8));
        }
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_eviction_skips_tile_in_use() {
        let mut cache = cache(2);
        cache.put(key(1), tile(1));
        cache.put(key(2), tile(2));

        // Renderer holds tile 1 while it is still the eldest entry.
        let drawing = cache.peek(&key(1)).cloned().unwrap();
        cache.put(key(3), tile(3));

        assert!(cache.contains_key(&key(1)));
        assert!(!cache.contains_key(&key(2)));
        drop(drawing);
    }

    #[test]
    fn test_all_in_use_evicts_eldest_and_defers_reclaim() {
        let pool = Arc::new(RasterPool::new(16));
        let mut cache = LruTileCache::new(1, Arc::clone(&pool));
        cache.put(key(1), tile(1));
        let drawing = cache.peek(&key(1)).cloned().unwrap();

        cache.put(key(2), tile(2));
        assert!(!cache.contains_key(&key(1)));
        assert_eq!(pool.stats().deferred, 1);
        assert_eq!(pool.free_buffers(), 0);

        drop(drawing);
        cache.put(key(3), tile(3));
        assert_eq!(pool.stats().deferred, 0);
        // Tile 1 (released late) and tile 2 (evicted by tile 3) are both back.
        assert_eq!(pool.free_buffers(), 2);
    }

    #[test]
    fn test_removal_listener_sees_every_removal() {
        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&removed);

        let mut cache = cache(2);
        cache.set_removal_listener(move |k| sink.lock().push(k.clone()));

        cache.put(key(1), tile(1));
        cache.put(key(2), tile(2));
        cache.put(key(3), tile(3)); // evicts 1
        assert!(cache.remove(&key(2)));
        assert!(!cache.remove(&key(2)));
        cache.put(key(4), tile(4));
        cache.clear();

        let removed = removed.lock().clone();
        assert_eq!(removed[0], key(1));
        assert_eq!(removed[1], key(2));
        assert_eq!(removed.len(), 4);
        assert!(removed.contains(&key(3)));
        assert!(removed.contains(&key(4)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_recycles_every_raster() {
        let pool = Arc::new(RasterPool::new(16));
        let mut cache = LruTileCache::new(8, Arc::clone(&pool));
        for n in 0..5 {
            cache.put(key(n), tile(n as u8));
        }

        cache.clear();
        assert_eq!(pool.free_buffers(), 5);
        assert_eq!(cache.stats().removals, 5);
    }

    #[test]
    fn test_reinserting_same_raster_is_not_a_removal() {
        let removed = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&removed);

        let mut cache = cache(4);
        cache.set_removal_listener(move |_| *counter.lock() += 1);
        cache.put(key(1), tile(1));

        let stale = cache.get(&key(1)).unwrap().into_expired();
        cache.put(key(1), stale);

        assert_eq!(*removed.lock(), 0);
        assert!(cache.peek(&key(1)).unwrap().is_expired());
    }
}
