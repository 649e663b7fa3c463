//! Raster payloads and cached tile handles.

use std::sync::Arc;

/// How the bytes of a [`Raster`] are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterLayout {
    /// Bytes exactly as the provider returned them (PNG, JPEG, ...).
    Encoded,
    /// Decoded, tightly packed pixel rows.
    Pixels { width: u32, height: u32, channels: u8 },
}

/// Raster data produced by a provider.
#[derive(Debug, PartialEq, Eq)]
pub struct Raster {
    data: Vec<u8>,
    layout: RasterLayout,
}

impl Raster {
    /// Wrap encoded bytes.
    pub fn encoded(data: Vec<u8>) -> Self {
        Self {
            data,
            layout: RasterLayout::Encoded,
        }
    }

    /// Wrap decoded pixels.
    pub fn pixels(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            data,
            layout: RasterLayout::Pixels {
                width,
                height,
                channels,
            },
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn layout(&self) -> RasterLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Give up the backing buffer, e.g. to hand it back to a pool.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A tile as stored in and returned from the cache.
///
/// Cloning is cheap: clones share the same raster. A renderer keeps a tile
/// "in use" simply by holding a clone; the cache will not recycle the raster's
/// buffer until every clone is gone.
#[derive(Debug, Clone)]
pub struct CachedTile {
    raster: Arc<Raster>,
    expired: bool,
}

impl CachedTile {
    /// A fresh (non-expired) tile.
    pub fn new(raster: Raster) -> Self {
        Self::from_shared(Arc::new(raster), false)
    }

    pub fn from_shared(raster: Arc<Raster>, expired: bool) -> Self {
        Self { raster, expired }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn shared_raster(&self) -> &Arc<Raster> {
        &self.raster
    }

    /// Stale but still drawable while a fresher copy is fetched.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn mark_expired(&mut self) {
        self.expired = true;
    }

    pub fn into_expired(mut self) -> Self {
        self.mark_expired();
        self
    }

    /// Whether some holder other than this handle references the raster.
    pub fn is_in_use(&self) -> bool {
        Arc::strong_count(&self.raster) > 1
    }

    pub(crate) fn into_raster(self) -> Arc<Raster> {
        self.raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_raster() {
        let raster = Raster::encoded(b"TILE_5_3_3".to_vec());
        assert_eq!(raster.data(), b"TILE_5_3_3");
        assert_eq!(raster.layout(), RasterLayout::Encoded);
        assert_eq!(raster.len(), 10);
        assert!(!raster.is_empty());
    }

    #[test]
    fn test_pixel_raster_layout() {
        let raster = Raster::pixels(vec![0; 2 * 2 * 4], 2, 2, 4);
        assert_eq!(
            raster.layout(),
            RasterLayout::Pixels {
                width: 2,
                height: 2,
                channels: 4
            }
        );
        assert_eq!(raster.into_data().len(), 16);
    }

    #[test]
    fn test_expired_flag() {
        let tile = CachedTile::new(Raster::encoded(vec![1]));
        assert!(!tile.is_expired());

        let stale = tile.clone().into_expired();
        assert!(stale.is_expired());
        // The original handle keeps its own flag.
        assert!(!tile.is_expired());
    }

    #[test]
    fn test_in_use_tracks_clones() {
        let tile = CachedTile::new(Raster::encoded(vec![1, 2, 3]));
        assert!(!tile.is_in_use());

        let held = tile.clone();
        assert!(tile.is_in_use());
        assert!(Arc::ptr_eq(tile.shared_raster(), held.shared_raster()));

        drop(held);
        assert!(!tile.is_in_use());
    }
}
