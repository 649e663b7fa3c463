//! Tile identity and raster handles.
//!
//! - [`TileKey`] names a tile: source namespace plus zoom/x/y.
//! - [`Raster`] is the opaque payload a provider produced (encoded bytes or
//!   decoded pixels).
//! - [`CachedTile`] is what the cache stores and hands out: a shared raster
//!   reference plus the "expired but usable" flag.
//! - [`TileDecoder`] turns fetched bytes into a [`Raster`], drawing buffers
//!   from the [`RasterPool`](crate::cache::RasterPool).

mod decode;
mod key;
mod raster;

pub use decode::{DecodeError, ImageTileDecoder, RawTileDecoder, TileDecoder};
pub use key::{TileKey, MAX_ZOOM};
pub use raster::{CachedTile, Raster, RasterLayout};
