//! Local tile archive provider.
//!
//! An archive is a read-only key → bytes store consulted before the network.
//! [`DirectoryArchive`] reads `root/namespace/z/x/y.ext` files; entries older
//! than the configured maximum age come back flagged as expired so the layer
//! shows them and keeps looking for a fresher copy.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::trace;

use super::types::{FetchedTile, ProviderError, TileProvider};
use crate::config::ArchiveConfig;
use crate::tile::TileKey;

/// A stored tile and, when known, its modification time.
#[derive(Debug, Clone)]
pub struct ArchivedTile {
    pub bytes: Vec<u8>,
    pub modified: Option<SystemTime>,
}

/// Read access to stored tiles.
pub trait TileArchive: Send + Sync {
    /// `Ok(None)` when the archive has no entry for `key`.
    fn read(&self, key: &TileKey) -> io::Result<Option<ArchivedTile>>;
}

/// Tiles stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
    extension: String,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for `key`.
    pub fn tile_path(&self, key: &TileKey) -> PathBuf {
        self.root
            .join(key.namespace())
            .join(key.zoom().to_string())
            .join(key.x().to_string())
            .join(format!("{}.{}", key.y(), self.extension))
    }
}

impl TileArchive for DirectoryArchive {
    fn read(&self, key: &TileKey) -> io::Result<Option<ArchivedTile>> {
        let path = self.tile_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Ok(Some(ArchivedTile { bytes, modified }))
    }
}

/// In-process archive, handy for seeding and tests.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    tiles: RwLock<HashMap<TileKey, ArchivedTile>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: TileKey, bytes: Vec<u8>) {
        self.insert_with_time(key, bytes, SystemTime::now());
    }

    pub fn insert_with_time(&self, key: TileKey, bytes: Vec<u8>, modified: SystemTime) {
        self.tiles.write().insert(
            key,
            ArchivedTile {
                bytes,
                modified: Some(modified),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }
}

impl TileArchive for MemoryArchive {
    fn read(&self, key: &TileKey) -> io::Result<Option<ArchivedTile>> {
        Ok(self.tiles.read().get(key).cloned())
    }
}

/// Serves tiles from a [`TileArchive`]. Never needs the network.
pub struct ArchiveProvider<A: TileArchive> {
    archive: A,
    config: ArchiveConfig,
}

impl<A: TileArchive> ArchiveProvider<A> {
    pub fn new(archive: A, config: ArchiveConfig) -> Self {
        Self { archive, config }
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    fn is_expired(&self, modified: Option<SystemTime>) -> bool {
        match (self.config.max_age(), modified) {
            (Some(max_age), Some(modified)) => SystemTime::now()
                .duration_since(modified)
                .map(|age| age > max_age)
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl<A: TileArchive> TileProvider for ArchiveProvider<A> {
    fn name(&self) -> &str {
        "archive"
    }

    fn fetch_tile(&self, key: &TileKey) -> Result<FetchedTile, ProviderError> {
        if !self.supports_zoom(key.zoom()) {
            return Err(ProviderError::UnsupportedZoom(key.zoom()));
        }
        let tile = self.archive.read(key)?.ok_or(ProviderError::NotFound)?;
        let expired = self.is_expired(tile.modified);
        trace!(tile = %key, expired, "Archive hit");
        Ok(FetchedTile {
            bytes: tile.bytes,
            expired,
        })
    }

    fn min_zoom(&self) -> u8 {
        self.config.min_zoom()
    }

    fn max_zoom(&self) -> u8 {
        self.config.max_zoom()
    }

    fn requires_network(&self) -> bool {
        false
    }

    fn worker_threads(&self) -> usize {
        self.config.threads()
    }

    fn max_queue_size(&self) -> usize {
        self.config.queue_size()
    }
}
