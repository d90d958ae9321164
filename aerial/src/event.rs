//! Notifications emitted by the [`TileGridManager`](crate::grid::TileGridManager).
//!
//! The manager does not render anything by itself. Instead, it reports every change of the grid to
//! an [`EventSink`], and the application decides how to paint the tiles. All events of one grid
//! carry the generation number of that grid, so a sink can tell apart tiles of a grid that was
//! already replaced.

use std::path::PathBuf;
use std::sync::Arc;

use aerial_types::TileId;
use tokio::sync::mpsc::UnboundedSender;

use crate::decoded_image::DecodedImage;
use crate::error::ErrorKind;
use crate::grid::ManagerState;

/// Change in the state of the tile grid.
#[derive(Debug, Clone)]
pub enum GridEvent {
    /// Tile is being loaded.
    RequestStarted {
        /// Tile being loaded.
        id: TileId,
        /// Url of the tile at the tile server.
        url: String,
        /// Generation of the grid the tile belongs to.
        generation: u64,
    },
    /// Tile is loaded and can be drawn in the given grid cell.
    ///
    /// If a tile occupies several cells, this event is emitted once for each of them.
    TileReady {
        /// Index of the cell in the grid plan.
        cell_index: usize,
        /// Loaded tile.
        id: TileId,
        /// Decoded tile pixels.
        image: Arc<DecodedImage>,
        /// Position of the south-west corner of the cell in meters (east, north) relative to the
        /// reference point.
        plane_offset: (f64, f64),
        /// Edge length of the cell in meters.
        size_meters: f64,
        /// Generation of the grid the tile belongs to.
        generation: u64,
    },
    /// All tiles of the grid were either loaded or failed.
    GridComplete {
        /// Tile containing the reference point.
        anchor: TileId,
        /// Generation of the completed grid.
        generation: u64,
        /// Number of tiles loaded.
        loaded: usize,
        /// Number of tiles that failed to load.
        failed: usize,
        /// Ground resolution at the reference point, meters per pixel.
        resolution: f64,
    },
    /// Something went wrong. If `id` is set, the error concerns a single tile, otherwise it concerns
    /// the whole grid or its configuration.
    Error {
        /// Tile that failed to load.
        id: Option<TileId>,
        /// Error category.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },
    /// Manager moved to a new state.
    StateChanged {
        /// New state.
        state: ManagerState,
        /// Current generation.
        generation: u64,
    },
    /// Tile drawing settings changed. The grid itself does not change.
    RenderSettingsChanged {
        /// Opacity of the tiles, `0.0..=1.0`.
        alpha: f32,
        /// Whether the tiles are drawn under other geometry.
        draw_under: bool,
    },
    /// Loaded tiles of the grid were copied to a folder.
    GridSaved {
        /// Target folder.
        folder: PathBuf,
        /// Number of tiles written.
        tiles: usize,
    },
}

/// Receiver of [`GridEvent`]s.
pub trait EventSink: Send + Sync {
    /// Handles the event.
    fn notify(&self, event: GridEvent);
}

impl<T: Fn(GridEvent) + Send + Sync> EventSink for T {
    fn notify(&self, event: GridEvent) {
        self(event)
    }
}

impl EventSink for UnboundedSender<GridEvent> {
    fn notify(&self, event: GridEvent) {
        if self.send(event).is_err() {
            log::trace!("Grid event receiver is closed, event is dropped");
        }
    }
}

/// Sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummySink;

impl EventSink for DummySink {
    fn notify(&self, _event: GridEvent) {}
}
