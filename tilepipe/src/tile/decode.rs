//! Turning fetched bytes into rasters.

use crate::cache::RasterPool;
use crate::tile::Raster;
use image::{ImageDecoder, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while decoding a tile payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Provider returned no bytes
    #[error("Empty tile payload")]
    Empty,

    /// Payload format could not be determined
    #[error("Unrecognised tile format: {0}")]
    UnknownFormat(String),

    /// Image decoder rejected the payload
    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Converts fetched bytes into a [`Raster`].
///
/// Implementations should draw their output buffer from `pool` so evicted
/// rasters get reused.
pub trait TileDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], pool: &RasterPool) -> Result<Raster, DecodeError>;
}

/// Keeps the payload encoded; the renderer decodes on its own terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTileDecoder;

impl TileDecoder for RawTileDecoder {
    fn decode(&self, bytes: &[u8], pool: &RasterPool) -> Result<Raster, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut buffer = pool.acquire(bytes.len());
        buffer.extend_from_slice(bytes);
        Ok(Raster::encoded(buffer))
    }
}

/// Decodes PNG/JPEG payloads into packed pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTileDecoder;

impl TileDecoder for ImageTileDecoder {
    fn decode(&self, bytes: &[u8], pool: &RasterPool) -> Result<Raster, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::UnknownFormat(e.to_string()))?
            .into_decoder()?;

        let (width, height) = decoder.dimensions();
        let channels = decoder.color_type().channel_count();
        let total = usize::try_from(decoder.total_bytes())
            .map_err(|_| DecodeError::UnknownFormat(format!("{}x{} tile too large", width, height)))?;

        let mut buffer = pool.acquire(total);
        buffer.resize(total, 0);
        if let Err(e) = decoder.read_image(&mut buffer) {
            pool.recycle(buffer);
            return Err(e.into());
        }

        Ok(Raster::pixels(buffer, width, height, channels))
    }
}
