//! `tilepipe fetch`: request one tile and wait for the outcome.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use tilepipe::config::LayerConfig;
use tilepipe::layer::{TileEvent, TileLayer};
use tilepipe::tile::{CachedTile, ImageTileDecoder, RasterLayout, RawTileDecoder, TileDecoder, TileKey};
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Zoom level
    #[arg(long, short)]
    pub zoom: u8,

    /// Tile column
    #[arg(long, short)]
    pub x: u32,

    /// Tile row
    #[arg(long, short)]
    pub y: u32,

    /// Tile namespace (defaults to [cache] namespace)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Write the tile bytes to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Skip providers that need the network
    #[arg(long)]
    pub offline: bool,

    /// Decode the tile into pixels instead of keeping the encoded bytes
    #[arg(long)]
    pub decode: bool,

    /// Seconds to wait for the tile
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

/// How a fetch ended.
#[derive(Debug)]
enum Fetched {
    Fresh(CachedTile),
    /// Only a stale copy could be found.
    Stale(CachedTile),
}

pub fn run(args: FetchArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    let config = runner.config();

    let namespace = args
        .namespace
        .clone()
        .unwrap_or_else(|| config.cache.namespace.clone());
    let key = TileKey::new(namespace, args.zoom, args.x, args.y);
    if !key.is_within_grid() {
        warn!(tile = %key, "Tile coordinates outside the zoom level's grid");
    }

    let layer_config = LayerConfig::from(config)
        .with_use_network(config.network.use_data_connection && !args.offline);
    let decoder: Arc<dyn TileDecoder> = if args.decode {
        Arc::new(ImageTileDecoder)
    } else {
        Arc::new(RawTileDecoder)
    };
    let layer = runner.create_layer(layer_config, decoder)?;

    let started = Instant::now();
    let fetched = fetch(&layer, &key, Duration::from_secs(args.timeout))?;
    let tile = match fetched {
        Fetched::Fresh(tile) => tile,
        Fetched::Stale(tile) => {
            warn!(tile = %key, "Only an expired copy was available");
            tile
        }
    };

    info!(
        tile = %key,
        bytes = tile.raster().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Tile fetched"
    );
    println!("{}", describe(&key, &tile));
    println!("{}", layer.stats());

    if let Some(path) = &args.output {
        std::fs::write(path, tile.raster().data()).map_err(|error| CliError::FileWrite {
            path: path.clone(),
            error,
        })?;
        println!("Wrote {} bytes to {}", tile.raster().len(), path.display());
    }

    Ok(())
}

/// Request `key` and wait for its terminal event.
fn fetch(layer: &TileLayer, key: &TileKey, timeout: Duration) -> Result<Fetched, CliError> {
    let (tx, rx) = mpsc::channel();
    let wanted = key.clone();
    layer.set_listener(move |event: TileEvent| {
        if event.key() == &wanted {
            let _ = tx.send(event);
        }
    });

    if let Some(tile) = layer.get_tile(key) {
        if !tile.is_expired() {
            return Ok(Fetched::Fresh(tile));
        }
    }

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(TileEvent::Loaded(_)) => {
                if let Some(tile) = layer.get_tile(key) {
                    return Ok(Fetched::Fresh(tile));
                }
                // Evicted before we could read it; ask again.
                continue;
            }
            Ok(TileEvent::Expired(_)) => {
                info!(tile = %key, "Expired copy found, looking for a fresher one");
            }
            Ok(TileEvent::Failed(_)) => {
                return match layer.get_tile(key) {
                    Some(tile) => Ok(Fetched::Stale(tile)),
                    None => Err(CliError::TileFailed(key.clone())),
                };
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return Err(CliError::Timeout {
                    tile: key.clone(),
                    waited: timeout,
                });
            }
        }
    }
}

fn describe(key: &TileKey, tile: &CachedTile) -> String {
    let raster = tile.raster();
    let shape = match raster.layout() {
        RasterLayout::Encoded => "encoded".to_string(),
        RasterLayout::Pixels {
            width,
            height,
            channels,
        } => format!("{}x{} px, {} channel(s)", width, height, channels),
    };
    format!(
        "{}: {} bytes ({}){}",
        key,
        raster.len(),
        shape,
        if tile.is_expired() { " [expired]" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilepipe::config::ArchiveConfig;
    use tilepipe::log::NoOpLogger;
    use tilepipe::provider::{ArchiveProvider, MemoryArchive, TileProvider};
    use tilepipe::tile::Raster;

    fn archive_layer(tiles: &[(TileKey, &[u8])]) -> TileLayer {
        let archive = MemoryArchive::new();
        for (key, bytes) in tiles {
            archive.insert(key.clone(), bytes.to_vec());
        }
        let provider: Arc<dyn TileProvider> =
            Arc::new(ArchiveProvider::new(archive, ArchiveConfig::new()));
        TileLayer::new(
            LayerConfig::new(),
            vec![provider],
            Arc::new(RawTileDecoder),
            Arc::new(NoOpLogger),
        )
        .unwrap()
    }

    #[test]
    fn test_fetch_waits_for_loaded_tile() {
        let key = TileKey::new("osm", 3, 2, 1);
        let layer = archive_layer(&[(key.clone(), &b"png"[..])]);

        match fetch(&layer, &key, Duration::from_secs(5)).unwrap() {
            Fetched::Fresh(tile) => assert_eq!(tile.raster().data(), b"png"),
            other => panic!("expected a fresh tile, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_missing_tile_fails() {
        let key = TileKey::new("osm", 3, 2, 1);
        let layer = archive_layer(&[]);

        let err = fetch(&layer, &key, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, CliError::TileFailed(k) if k == key));
    }

    #[test]
    fn test_describe_encoded() {
        let key = TileKey::new("osm", 2, 1, 1);
        let tile = CachedTile::new(Raster::encoded(vec![0; 10]));
        assert_eq!(describe(&key, &tile), "osm/2/1/1: 10 bytes (encoded)");
    }

    #[test]
    fn test_describe_pixels_expired() {
        let key = TileKey::new("osm", 2, 1, 1);
        let tile = CachedTile::new(Raster::pixels(vec![0; 16], 2, 2, 4)).into_expired();
        assert_eq!(
            describe(&key, &tile),
            "osm/2/1/1: 16 bytes (2x2 px, 4 channel(s)) [expired]"
        );
    }
}
