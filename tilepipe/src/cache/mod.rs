//! In-memory tile cache with raster recycling.
//!
//! [`LruTileCache`] keeps a bounded number of tiles in access order and hands
//! every removed raster to a [`RasterPool`], which recycles the buffer right
//! away or, if a renderer still holds the tile, once it lets go.

mod lru;
mod pool;
mod stats;

pub use self::lru::{LruTileCache, RemovalListener};
pub use pool::{PoolStats, RasterPool};
pub use stats::CacheStats;
