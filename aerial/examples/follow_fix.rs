//! This example follows a short walk through Zurich and keeps the tile grid loaded around it.
//!
//! Tiles are downloaded from OpenStreetMap into `.tile_cache`, so running the example a second
//! time with the `--offline` flag loads the same grid without network access. A JSON file with a
//! [`MapConfig`] can be given as the first argument.
//!
//! ```shell
//! cargo run --example follow_fix -- ./map.json
//! cargo run --example follow_fix -- --offline
//! ```

use aerial::event::GridEvent;
use aerial::{latlon, MapConfig, TileGridManager};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut offline = false;
    let mut config = MapConfig {
        zoom: 17,
        radius: 2,
        ..Default::default()
    };
    for arg in std::env::args().skip(1) {
        if arg == "--offline" {
            offline = true;
        } else {
            config = MapConfig::load(&arg)?;
        }
    }
    config.offline |= offline;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                GridEvent::TileReady { id, plane_offset, .. } => log::info!(
                    "Tile {id} ready at ({:.1} m, {:.1} m)",
                    plane_offset.0,
                    plane_offset.1
                ),
                GridEvent::GridComplete {
                    anchor,
                    generation,
                    loaded,
                    failed,
                    resolution,
                } => log::info!(
                    "Grid {generation} around {anchor} complete: {loaded} loaded, {failed} failed, {resolution:.3} m/px"
                ),
                GridEvent::Error { id, kind, message } => {
                    log::warn!("{kind:?} error for {id:?}: {message}")
                }
                _ => {}
            }
        }
    });

    let mut manager = TileGridManager::builder(config).with_sink(tx).build()?;

    let walk = [
        latlon!(47.3769, 8.5417),
        latlon!(47.3771, 8.5419),
        latlon!(47.3775, 8.5431),
        latlon!(47.3782, 8.5446),
        latlon!(47.3790, 8.5460),
    ];

    for fix in walk {
        log::info!("Fix at ({}, {})", fix.lat(), fix.lon());
        manager.update_reference(fix);
        let state = manager.wait_until_ready().await;
        log::info!("Manager is {state} at generation {}", manager.generation());
    }

    Ok(())
}
