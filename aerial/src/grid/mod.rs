//! The tile grid around the reference point and the [`TileGridManager`] that keeps it loaded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aerial_types::geo::web_mercator;
use aerial_types::geo::ReferencePoint;
use aerial_types::TileId;
use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::async_runtime;
use crate::cache::{FileTileCache, TileCache};
use crate::config::MapConfig;
use crate::control::ControlSignal;
use crate::decoded_image::ImageDecoder;
use crate::error::AerialError;
use crate::event::{EventSink, GridEvent};
use crate::fetcher::{FetchResult, TileFetcher};
use crate::platform::TileTransport;
use crate::source::{SourceKey, TileSource};

mod builder;
mod plan;
mod state;

pub use builder::TileGridManagerBuilder;
pub use plan::{plan, GridCell, GridPlan, MAX_RADIUS};
pub use state::{GridState, ManagerState, TileStatus};

use state::PlanKey;

struct Completion {
    id: TileId,
    generation: u64,
    result: FetchResult,
}

/// Keeps a square grid of map tiles loaded around the latest reference point.
///
/// The manager goes through the following states:
///
/// * [`Idle`](ManagerState::Idle) until the first reference point is received, or when the
///   configuration is invalid;
/// * [`Planning`](ManagerState::Planning) when the grid needs to be rebuilt. That happens when the
///   reference point moves to another tile or when a setting the grid depends on changes (zoom,
///   radius, tile source, offline mode, cache folder);
/// * [`Loading`](ManagerState::Loading) while the tiles of the grid are being fetched;
/// * [`Ready`](ManagerState::Ready) when every tile is either loaded or failed.
///
/// Every new grid gets a new generation number. Tiles that finish loading after their grid was
/// replaced are dropped.
///
/// Tiles are loaded in background tasks, so the manager must be used inside a `tokio` runtime.
/// Loaded tiles are applied to the grid when the application calls
/// [`TileGridManager::process_completions`] (for example, once per frame) or
/// [`TileGridManager::wait_until_ready`].
pub struct TileGridManager {
    config: MapConfig,
    reference: Option<ReferencePoint>,
    state: ManagerState,
    generation: u64,
    grid: Option<GridState>,
    plan_key: Option<PlanKey>,
    fetcher: Option<(PathBuf, Arc<TileFetcher>)>,
    transport: Arc<dyn TileTransport>,
    decoder: Arc<dyn ImageDecoder>,
    sink: Arc<dyn EventSink>,
    reported_error: Option<String>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl std::fmt::Debug for TileGridManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileGridManager")
            .field("config", &self.config)
            .field("reference", &self.reference)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}

impl TileGridManager {
    /// Creates a builder for a manager with the given configuration.
    pub fn builder(config: MapConfig) -> TileGridManagerBuilder {
        TileGridManagerBuilder::new(config)
    }

    pub(crate) fn new(
        config: MapConfig,
        transport: Arc<dyn TileTransport>,
        decoder: Arc<dyn ImageDecoder>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            config,
            reference: None,
            state: ManagerState::Idle,
            generation: 0,
            grid: None,
            plan_key: None,
            fetcher: None,
            transport,
            decoder,
            sink,
            reported_error: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Generation of the current grid. Increases every time the grid is replaced or dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The latest reference point.
    pub fn reference(&self) -> Option<ReferencePoint> {
        self.reference
    }

    /// The current grid, if any.
    pub fn grid(&self) -> Option<&GridState> {
        self.grid.as_ref()
    }

    /// Ground resolution at the reference point in meters per pixel.
    pub fn resolution(&self) -> Option<f64> {
        self.grid.as_ref().map(|grid| grid.plan().resolution())
    }

    /// Sets a new reference point.
    ///
    /// The grid is rebuilt only if the point is in another tile than the current grid centre. A
    /// point that cannot be shown on the map is reported with an error event and ignored.
    pub fn update_reference(&mut self, point: ReferencePoint) {
        if let Err(err) = web_mercator::tile_coords(&point, 0) {
            let err = AerialError::from(err);
            log::warn!(
                "Ignoring reference point ({}, {}): {err}",
                point.lat(),
                point.lon()
            );
            self.notify_error(None, &err);
            return;
        }

        self.reference = Some(point);
        self.replan(false);
    }

    /// Replaces the whole configuration.
    pub fn set_config(&mut self, config: MapConfig) {
        let render_changed =
            config.alpha != self.config.alpha || config.draw_under != self.config.draw_under;
        self.config = config;

        if render_changed {
            self.notify_render_settings();
        }
        self.replan(false);
    }

    /// Sets the zoom level, clamping it to the supported range.
    pub fn set_zoom(&mut self, zoom: u32) {
        self.config.set_zoom(zoom);
        self.replan(false);
    }

    /// Sets the grid radius, clamping it to the supported range.
    pub fn set_radius(&mut self, radius: u32) {
        self.config.set_radius(radius);
        self.replan(false);
    }

    /// Sets the url template of the tile source.
    pub fn set_source_template(&mut self, template: impl Into<String>) {
        self.config.source_template = template.into();
        self.replan(false);
    }

    /// Turns offline mode on or off.
    pub fn set_offline(&mut self, offline: bool) {
        self.config.offline = offline;
        self.replan(false);
    }

    /// Sets the folder of the persistent tile cache.
    pub fn set_cache_root(&mut self, cache_root: impl Into<PathBuf>) {
        self.config.cache_root = cache_root.into();
        self.replan(false);
    }

    /// Sets the tile opacity. Does not change the grid.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.config.set_alpha(alpha);
        self.notify_render_settings();
    }

    /// Sets whether the tiles are drawn under other geometry. Does not change the grid.
    pub fn set_draw_under(&mut self, draw_under: bool) {
        self.config.draw_under = draw_under;
        self.notify_render_settings();
    }

    /// Builds the grid again and reloads all its tiles, including the failed ones.
    pub fn refresh(&mut self) {
        self.replan(true);
    }

    /// Drops the grid and the reference point. The manager stays idle until the next reference
    /// point.
    pub fn reset(&mut self) {
        log::debug!("Resetting tile grid");
        self.generation += 1;
        self.grid = None;
        self.plan_key = None;
        self.reference = None;
        self.set_state(ManagerState::Idle);
    }

    /// Handles a control signal.
    pub fn handle_signal(&mut self, signal: ControlSignal) {
        match signal {
            ControlSignal::SaveCurrentGrid { folder } => self.save_current_grid(folder),
            ControlSignal::LoadGridFrom { folder } => {
                log::info!("Loading tiles from {folder:?}");
                self.config.cache_root = folder;
                self.config.offline = true;
                self.replan(false);
            }
            ControlSignal::SetOffline(offline) => self.set_offline(offline),
        }
    }

    /// Applies all tiles that finished loading so far. Does not wait for the tiles that are still
    /// loading.
    ///
    /// Returns the number of processed tile results, including the dropped ones.
    pub fn process_completions(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion);
            processed += 1;
        }

        processed
    }

    /// Waits until all tiles of the current grid are loaded or failed.
    ///
    /// Returns immediately if the grid is not loading.
    pub async fn wait_until_ready(&mut self) -> ManagerState {
        while matches!(self.state, ManagerState::Loading | ManagerState::Planning) {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            self.apply_completion(completion);
        }

        self.state
    }

    fn replan(&mut self, force: bool) {
        let Some(reference) = self.reference else {
            log::trace!("No reference point yet, tile grid is not planned");
            return;
        };

        let (plan, source) = match self.prepare_plan(&reference) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.abandon_grid(err);
                return;
            }
        };

        let key = PlanKey {
            anchor: plan.anchor(),
            radius: plan.radius(),
            source: source.key().clone(),
            offline: self.config.offline,
            cache_root: self.config.cache_root.clone(),
        };

        let is_active = matches!(self.state, ManagerState::Loading | ManagerState::Ready);
        if !force && is_active && self.plan_key.as_ref() == Some(&key) {
            log::trace!("Tile grid around {} is up to date", key.anchor);
            return;
        }

        let cache_root = self.config.cache_root.clone();
        let fetcher = match self.fetcher_for(&cache_root) {
            Ok(fetcher) => fetcher,
            Err(err) => {
                self.abandon_grid(err);
                return;
            }
        };

        self.reported_error = None;
        self.generation += 1;
        self.set_state(ManagerState::Planning);

        let generation = self.generation;
        let offline = self.config.offline;
        let tiles = plan.tiles();
        log::debug!(
            "Planned tile grid {generation} around {}: {} cells, {} tiles",
            plan.anchor(),
            plan.cells().len(),
            tiles.len()
        );

        self.grid = Some(GridState::new(plan, source.clone(), generation));
        self.plan_key = Some(key);

        if tiles.is_empty() {
            self.finish_if_complete();
            return;
        }

        self.set_state(ManagerState::Loading);
        for id in tiles {
            self.sink.notify(GridEvent::RequestStarted {
                id,
                url: source.url_for(&id),
                generation,
            });
            self.dispatch(fetcher.clone(), id, source.clone(), offline, generation);
        }
    }

    fn prepare_plan(
        &self,
        reference: &ReferencePoint,
    ) -> Result<(GridPlan, TileSource), AerialError> {
        self.config.validate()?;
        let source = TileSource::new(&self.config.source_template)?;
        let plan = plan(reference, self.config.zoom, self.config.radius)?;
        Ok((plan, source))
    }

    fn fetcher_for(&mut self, cache_root: &Path) -> Result<Arc<TileFetcher>, AerialError> {
        if let Some((root, fetcher)) = &self.fetcher {
            if root == cache_root {
                return Ok(fetcher.clone());
            }
        }

        log::debug!("Using tile cache at {cache_root:?}");
        let cache: Arc<dyn TileCache> = Arc::new(FileTileCache::new(cache_root)?);
        let fetcher = Arc::new(TileFetcher::new(
            cache,
            self.transport.clone(),
            self.decoder.clone(),
        ));
        self.fetcher = Some((cache_root.to_path_buf(), fetcher.clone()));

        Ok(fetcher)
    }

    fn dispatch(
        &self,
        fetcher: Arc<TileFetcher>,
        id: TileId,
        source: TileSource,
        offline: bool,
        generation: u64,
    ) {
        let completions = self.completions_tx.clone();
        async_runtime::spawn(async move {
            let load =
                async_runtime::spawn(async move { fetcher.fetch(id, &source, offline).await });
            let result = match load.await {
                Ok(result) => result,
                Err(err) => {
                    log::error!("Loading of tile {id} was aborted: {err}");
                    Err(AerialError::Internal(err.to_string()).into())
                }
            };

            if completions
                .send(Completion {
                    id,
                    generation,
                    result,
                })
                .is_err()
            {
                log::trace!("Tile grid manager is dropped, tile {id} is discarded");
            }
        });
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion {
            id,
            generation,
            result,
        } = completion;

        if generation != self.generation {
            log::trace!(
                "Dropping tile {id} of generation {generation}, current generation is {}",
                self.generation
            );
            return;
        }

        let Some(grid) = self.grid.as_mut() else {
            return;
        };

        match result {
            Ok(tile) => {
                log::trace!("Tile {id} is ready");
                for cell in grid.plan().cells_of(id) {
                    self.sink.notify(GridEvent::TileReady {
                        cell_index: cell.index,
                        id,
                        image: tile.image.clone(),
                        plane_offset: cell.plane_offset,
                        size_meters: cell.size_meters,
                        generation,
                    });
                }
                grid.set_status(id, TileStatus::Loaded(tile));
            }
            Err(err) => {
                log::warn!("Failed to load tile {id}: {err}");
                self.sink.notify(GridEvent::Error {
                    id: Some(id),
                    kind: err.kind,
                    message: err.message.clone(),
                });
                grid.set_status(id, TileStatus::Failed(err));
            }
        }

        self.finish_if_complete();
    }

    fn finish_if_complete(&mut self) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };

        if !grid.take_completion() {
            return;
        }

        let event = GridEvent::GridComplete {
            anchor: grid.plan().anchor(),
            generation: grid.generation(),
            loaded: grid.loaded_count(),
            failed: grid.failed_count(),
            resolution: grid.plan().resolution(),
        };
        log::debug!(
            "Tile grid {} is complete: {} loaded, {} failed",
            grid.generation(),
            grid.loaded_count(),
            grid.failed_count()
        );

        self.set_state(ManagerState::Ready);
        self.sink.notify(event);
    }

    fn abandon_grid(&mut self, err: AerialError) {
        let message = err.to_string();
        if self.reported_error.as_deref() != Some(message.as_str()) {
            log::warn!("Cannot build tile grid: {message}");
            self.notify_error(None, &err);
            self.reported_error = Some(message);
        }

        if self.grid.is_some() || self.state != ManagerState::Idle {
            self.generation += 1;
        }
        self.grid = None;
        self.plan_key = None;
        self.set_state(ManagerState::Idle);
    }

    fn save_current_grid(&self, folder: PathBuf) {
        let (source, tiles) = match &self.grid {
            Some(grid) => (Some(grid.source().key().clone()), grid.loaded_tiles()),
            None => (None, vec![]),
        };

        log::info!("Saving {} tiles to {folder:?}", tiles.len());
        let sink = self.sink.clone();
        async_runtime::spawn_blocking(move || {
            match save_tiles(&folder, source.as_ref(), &tiles) {
                Ok(count) => sink.notify(GridEvent::GridSaved {
                    folder,
                    tiles: count,
                }),
                Err(err) => {
                    log::warn!("Failed to save tiles to {folder:?}: {err}");
                    sink.notify(GridEvent::Error {
                        id: None,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        });
    }

    fn set_state(&mut self, state: ManagerState) {
        if self.state == state {
            return;
        }

        log::debug!("Tile grid state: {} -> {state}", self.state);
        self.state = state;
        self.sink.notify(GridEvent::StateChanged {
            state,
            generation: self.generation,
        });
    }

    fn notify_error(&self, id: Option<TileId>, err: &AerialError) {
        self.sink.notify(GridEvent::Error {
            id,
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    fn notify_render_settings(&self) {
        self.sink.notify(GridEvent::RenderSettingsChanged {
            alpha: self.config.alpha,
            draw_under: self.config.draw_under,
        });
    }
}

fn save_tiles(
    folder: &Path,
    source: Option<&SourceKey>,
    tiles: &[(TileId, Bytes)],
) -> Result<usize, AerialError> {
    let cache = FileTileCache::new(folder)?;
    let Some(source) = source else {
        return Ok(0);
    };

    for (id, data) in tiles {
        cache.store(id, source, data)?;
    }

    Ok(tiles.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use aerial_types::latlon;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use super::*;
    use crate::error::{ErrorKind, TileError};
    use crate::platform::HttpResponse;
    use crate::tests::{drain, stub_decoder, TestTransport};

    fn config(dir: &TempDir) -> MapConfig {
        MapConfig {
            source_template: "https://tile.example.com/{z}/{x}/{y}.png".into(),
            zoom: 19,
            radius: 1,
            cache_root: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn manager(
        config: MapConfig,
        transport: Arc<TestTransport>,
    ) -> (TileGridManager, UnboundedReceiver<GridEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = TileGridManager::builder(config)
            .with_transport(transport)
            .with_decoder(stub_decoder)
            .with_sink(tx)
            .build()
            .unwrap();
        (manager, rx)
    }

    fn completed_generations(events: &[GridEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|event| match event {
                GridEvent::GridComplete { generation, .. } => Some(*generation),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn stays_idle_without_reference() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(TestTransport::images());
        let (mut manager, mut events) = manager(config(&dir), transport.clone());

        manager.set_zoom(10);
        manager.set_radius(2);
        manager.refresh();

        assert_eq!(manager.state(), ManagerState::Idle);
        assert!(manager.grid().is_none());
        assert!(drain(&mut events).is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn loads_grid_around_reference() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(TestTransport::images());
        let (mut manager, mut events) = manager(config(&dir), transport.clone());

        manager.update_reference(latlon!(47.3977, 8.5456));
        assert_eq!(manager.state(), ManagerState::Loading);
        assert_eq!(manager.wait_until_ready().await, ManagerState::Ready);

        let grid = manager.grid().unwrap();
        assert_eq!(grid.loaded_count(), 9);
        assert_eq!(grid.failed_count(), 0);
        assert_eq!(transport.calls(), 9);

        let events = drain(&mut events);
        let ready = events
            .iter()
            .filter(|event| matches!(event, GridEvent::TileReady { .. }))
            .count();
        assert_eq!(ready, 9);
        assert_eq!(completed_generations(&events), vec![manager.generation()]);
    }

    #[tokio::test]
    async fn stale_completions_are_dropped() {
        let dir = TempDir::new().unwrap();
        let (mut manager, mut events) = manager(config(&dir), Arc::new(TestTransport::images()));

        manager.update_reference(latlon!(47.3977, 8.5456));
        let first = manager.generation();
        manager.refresh();
        assert_eq!(manager.generation(), first + 1);

        let anchor = manager.grid().unwrap().plan().anchor();
        manager.apply_completion(Completion {
            id: anchor,
            generation: first,
            result: Err(TileError::new(ErrorKind::Network, "late")),
        });
        assert_matches!(
            manager.grid().unwrap().status(anchor),
            Some(TileStatus::Pending)
        );

        manager.wait_until_ready().await;
        assert_matches!(
            manager.grid().unwrap().status(anchor),
            Some(TileStatus::Loaded(_))
        );

        let events = drain(&mut events);
        assert_eq!(completed_generations(&events), vec![first + 1]);
        assert!(!events.iter().any(|event| matches!(
            event,
            GridEvent::TileReady { generation, .. } if *generation == first
        )));
    }

    #[tokio::test]
    async fn same_tile_does_not_replan() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(TestTransport::images());
        let (mut manager, _events) = manager(config(&dir), transport.clone());

        manager.update_reference(latlon!(47.3977, 8.5456));
        let generation = manager.generation();
        manager.update_reference(latlon!(47.39771, 8.54561));
        assert_eq!(manager.generation(), generation);

        manager.wait_until_ready().await;
        manager.update_reference(latlon!(47.3977, 8.5456));
        assert_eq!(manager.generation(), generation);
        assert_eq!(manager.state(), ManagerState::Ready);
        assert_eq!(transport.calls(), 9);
    }

    #[tokio::test]
    async fn configuration_error_leaves_manager_idle() {
        let dir = TempDir::new().unwrap();
        let (mut manager, mut events) = manager(config(&dir), Arc::new(TestTransport::images()));

        manager.update_reference(latlon!(47.3977, 8.5456));
        manager.wait_until_ready().await;
        drain(&mut events);

        manager.set_source_template("https://tile.example.com/{z}/{x}.png");
        assert_eq!(manager.state(), ManagerState::Idle);
        assert!(manager.grid().is_none());

        manager.update_reference(latlon!(47.5, 8.6));
        let errors: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                GridEvent::Error { id, kind, .. } => Some((id, kind)),
                _ => None,
            })
            .collect();
        assert_eq!(errors, vec![(None, ErrorKind::InvalidTemplate)]);

        manager.set_source_template("https://tile.example.com/{z}/{x}/{y}.png");
        assert_eq!(manager.state(), ManagerState::Loading);
    }

    #[tokio::test]
    async fn invalid_reference_keeps_grid() {
        let dir = TempDir::new().unwrap();
        let (mut manager, mut events) = manager(config(&dir), Arc::new(TestTransport::images()));

        manager.update_reference(latlon!(47.3977, 8.5456));
        manager.wait_until_ready().await;
        let generation = manager.generation();
        drain(&mut events);

        manager.update_reference(latlon!(89.0, 8.5456));
        assert_eq!(manager.state(), ManagerState::Ready);
        assert_eq!(manager.generation(), generation);
        assert_eq!(manager.reference(), Some(latlon!(47.3977, 8.5456)));
        assert_matches!(
            drain(&mut events).as_slice(),
            [GridEvent::Error {
                id: None,
                kind: ErrorKind::InvalidLatitude,
                ..
            }]
        );
    }

    #[tokio::test]
    async fn render_settings_do_not_replan() {
        let dir = TempDir::new().unwrap();
        let (mut manager, mut events) = manager(config(&dir), Arc::new(TestTransport::images()));

        manager.update_reference(latlon!(47.3977, 8.5456));
        manager.wait_until_ready().await;
        let generation = manager.generation();
        drain(&mut events);

        manager.set_alpha(0.3);
        manager.set_draw_under(true);

        assert_eq!(manager.generation(), generation);
        assert_eq!(manager.state(), ManagerState::Ready);
        assert_matches!(
            drain(&mut events).as_slice(),
            [
                GridEvent::RenderSettingsChanged {
                    draw_under: false,
                    ..
                },
                GridEvent::RenderSettingsChanged {
                    draw_under: true,
                    ..
                }
            ]
        );
    }

    #[tokio::test]
    async fn reset_drops_grid() {
        let dir = TempDir::new().unwrap();
        let (mut manager, _events) = manager(config(&dir), Arc::new(TestTransport::images()));

        manager.update_reference(latlon!(47.3977, 8.5456));
        let generation = manager.generation();
        manager.reset();

        assert_eq!(manager.state(), ManagerState::Idle);
        assert!(manager.grid().is_none());
        assert!(manager.reference().is_none());
        assert_eq!(manager.generation(), generation + 1);

        manager.process_completions();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        manager.process_completions();
        assert_eq!(manager.state(), ManagerState::Idle);

        manager.set_zoom(18);
        assert_eq!(manager.state(), ManagerState::Idle);
    }

    #[tokio::test]
    async fn panicking_transport_fails_only_its_tile() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(TestTransport::new(|url| {
            if url.ends_with("/19/274589/183553.png") {
                panic!("transport bug");
            }
            Ok(HttpResponse::ok("image/png", format!("IMG {url}")))
        }));
        let (mut manager, mut events) = manager(config(&dir), transport);

        manager.update_reference(latlon!(47.3977, 8.5456));
        let state = tokio::time::timeout(Duration::from_secs(5), manager.wait_until_ready())
            .await
            .expect("grid is stuck loading");
        assert_eq!(state, ManagerState::Ready);

        let grid = manager.grid().unwrap();
        assert_eq!(grid.loaded_count(), 8);
        assert_eq!(grid.failed_count(), 1);

        let anchor = grid.plan().anchor();
        assert_matches!(
            grid.status(anchor),
            Some(TileStatus::Failed(err)) if err.kind == ErrorKind::Internal
        );
        assert_matches!(
            drain(&mut events).last(),
            Some(GridEvent::GridComplete {
                loaded: 8,
                failed: 1,
                ..
            })
        );
    }

    #[tokio::test]
    async fn unwritable_cache_does_not_fail_grid() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let source = TileSource::new(&config.source_template).unwrap();
        std::fs::write(dir.path().join(source.key().hash()), b"not a folder").unwrap();

        let transport = Arc::new(TestTransport::images());
        let (mut manager, _events) = manager(config, transport.clone());

        manager.update_reference(latlon!(47.3977, 8.5456));
        assert_eq!(manager.wait_until_ready().await, ManagerState::Ready);

        let grid = manager.grid().unwrap();
        assert_eq!(grid.loaded_count(), 9);
        assert_eq!(grid.failed_count(), 0);
        assert_eq!(transport.calls(), 9);
    }

    #[tokio::test]
    async fn failed_tiles_are_reloaded_on_refresh() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(TestTransport::new(|url| {
            Err(AerialError::Network(format!("{url} is unreachable")))
        }));
        let (mut manager, mut events) = manager(config(&dir), transport.clone());

        manager.update_reference(latlon!(47.3977, 8.5456));
        assert_eq!(manager.wait_until_ready().await, ManagerState::Ready);
        assert_eq!(manager.grid().unwrap().failed_count(), 9);

        let events_before = drain(&mut events);
        assert_matches!(
            events_before.last(),
            Some(GridEvent::GridComplete {
                loaded: 0,
                failed: 9,
                ..
            })
        );

        manager.refresh();
        manager.wait_until_ready().await;
        assert_eq!(transport.calls(), 18);
    }
}
