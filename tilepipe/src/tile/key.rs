//! Tile coordinate key.

use std::fmt;
use std::sync::Arc;

/// Highest zoom level whose grid still fits `u32` coordinates.
pub const MAX_ZOOM: u8 = 32;

/// Immutable identity of a map tile.
///
/// Equality and hashing cover the namespace as well as `(zoom, x, y)`: two
/// sources sharing one cache never collide, and a tile fetched for one
/// namespace is never served for another.
///
/// # Example
///
/// ```
/// use tilepipe::tile::TileKey;
///
/// let key = TileKey::new("osm", 5, 3, 3);
/// assert_eq!(key.to_string(), "osm/5/3/3");
/// assert_ne!(key, TileKey::new("satellite", 5, 3, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    namespace: Arc<str>,
    zoom: u8,
    x: u32,
    y: u32,
}

impl TileKey {
    /// Create a key for tile `(x, y)` at `zoom` in `namespace`.
    pub fn new(namespace: impl Into<Arc<str>>, zoom: u8, x: u32, y: u32) -> Self {
        Self {
            namespace: namespace.into(),
            zoom,
            x,
            y,
        }
    }

    /// Source namespace (cache key of the tile source).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Column, 0 at the west edge.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row, 0 at the north edge.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Whether `x` and `y` lie inside the `2^zoom` grid.
    pub fn is_within_grid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let size = 1u64 << self.zoom;
        u64::from(self.x) < size && u64::from(self.y) < size
    }

    /// Relative `zoom/x/y` path, without the namespace.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x, self.y)
    }

    /// Bing-style quadkey: one base-4 digit per zoom level, most significant
    /// level first. Zoom 0 yields an empty string.
    pub fn quadkey(&self) -> String {
        let mut quadkey = String::with_capacity(self.zoom as usize);
        for level in (1..=self.zoom.min(MAX_ZOOM)).rev() {
            let mask = 1u64 << (level - 1);
            let mut digit = b'0';
            if u64::from(self.x) & mask != 0 {
                digit += 1;
            }
            if u64::from(self.y) & mask != 0 {
                digit += 2;
            }
            quadkey.push(digit as char);
        }
        quadkey
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.namespace, self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_accessors() {
        let key = TileKey::new("osm", 12, 2048, 1361);
        assert_eq!(key.namespace(), "osm");
        assert_eq!(key.zoom(), 12);
        assert_eq!(key.x(), 2048);
        assert_eq!(key.y(), 1361);
        assert_eq!(key.path(), "12/2048/1361");
    }

    #[test]
    fn test_namespace_is_part_of_identity() {
        let mut set = HashSet::new();
        set.insert(TileKey::new("osm", 5, 3, 3));
        set.insert(TileKey::new("osm", 5, 3, 3));
        set.insert(TileKey::new("topo", 5, 3, 3));
        set.insert(TileKey::new("osm", 5, 3, 4));

        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_within_grid() {
        assert!(TileKey::new("t", 0, 0, 0).is_within_grid());
        assert!(!TileKey::new("t", 0, 1, 0).is_within_grid());
        assert!(TileKey::new("t", 3, 7, 7).is_within_grid());
        assert!(!TileKey::new("t", 3, 8, 0).is_within_grid());
        assert!(TileKey::new("t", 32, u32::MAX, u32::MAX).is_within_grid());
        assert!(!TileKey::new("t", 40, 0, 0).is_within_grid());
    }

    #[test]
    fn test_quadkey() {
        // Reference values from the Bing Maps tile system documentation.
        assert_eq!(TileKey::new("t", 3, 3, 5).quadkey(), "213");
        assert_eq!(TileKey::new("t", 1, 1, 1).quadkey(), "3");
        assert_eq!(TileKey::new("t", 0, 0, 0).quadkey(), "");
    }

    #[test]
    fn test_display() {
        let key = TileKey::new(String::from("sat"), 10, 512, 340);
        assert_eq!(format!("{}", key), "sat/10/512/340");
    }
}
