//! End-to-end: config file → provider factory → tile layer.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tilepipe::config::{ConfigFile, LayerConfig};
use tilepipe::layer::{TileEvent, TileLayer};
use tilepipe::log::NoOpLogger;
use tilepipe::provider::ProviderFactory;
use tilepipe::tile::{RawTileDecoder, TileKey};

fn write_config(temp: &TempDir, body: &str) -> ConfigFile {
    let path = temp.path().join("config.ini");
    std::fs::write(&path, body).unwrap();
    ConfigFile::load_from(&path).unwrap()
}

#[test]
fn test_layer_from_config_file() {
    let temp = TempDir::new().unwrap();
    let tiles = temp.path().join("tiles");
    let tile_path = tiles.join("osm").join("6").join("10").join("22.png");
    std::fs::create_dir_all(tile_path.parent().unwrap()).unwrap();
    std::fs::write(&tile_path, b"from disk").unwrap();

    let config = write_config(
        &temp,
        &format!(
            "[cache]\ncapacity = 16\nnamespace = osm\n\
             [network]\nuse_data_connection = false\n\
             [archive]\ndirectory = {}\nthreads = 2\n\
             [download]\nurl = http://127.0.0.1:9/{{z}}/{{x}}/{{y}}.png\n",
            tiles.display()
        ),
    );

    let providers = ProviderFactory::new().from_config_file(&config).unwrap();
    assert_eq!(providers.len(), 2);

    let layer = TileLayer::new(
        LayerConfig::from(&config),
        providers,
        Arc::new(RawTileDecoder),
        Arc::new(NoOpLogger),
    )
    .unwrap();
    assert_eq!(layer.capacity(), 16);
    assert!(!layer.use_network());
    assert_eq!(layer.provider_names(), vec!["archive", "downloader"]);

    let (tx, rx) = mpsc::channel();
    layer.set_listener(move |e: TileEvent| {
        let _ = tx.send(e);
    });

    let present = TileKey::new(config.cache.namespace.as_str(), 6, 10, 22);
    assert!(layer.get_tile(&present).is_none());
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        TileEvent::Loaded(present.clone())
    );
    assert_eq!(layer.get_tile(&present).unwrap().raster().data(), b"from disk");

    // Archive miss; the downloader is skipped while offline.
    let absent = TileKey::new("osm", 6, 11, 22);
    layer.get_tile(&absent);
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        TileEvent::Failed(absent)
    );
}

#[test]
fn test_saved_defaults_reload_identically() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.ini");
    ConfigFile::default().save_to(&path).unwrap();
    assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
}
