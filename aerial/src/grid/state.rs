use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use aerial_types::TileId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::GridPlan;
use crate::error::TileError;
use crate::fetcher::LoadedTile;
use crate::source::{SourceKey, TileSource};

/// State of the [`TileGridManager`](super::TileGridManager).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagerState {
    /// There is no grid: no reference point was received yet, or the configuration is invalid.
    Idle,
    /// A new grid is being laid out.
    Planning,
    /// Tiles of the grid are being loaded.
    Loading,
    /// Every tile of the grid is either loaded or failed.
    Ready,
}

impl Display for ManagerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ManagerState::Idle => "idle",
            ManagerState::Planning => "planning",
            ManagerState::Loading => "loading",
            ManagerState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Loading status of a single tile of the grid.
#[derive(Debug, Clone)]
pub enum TileStatus {
    /// Tile is being loaded.
    Pending,
    /// Tile is loaded.
    Loaded(Arc<LoadedTile>),
    /// Tile failed to load. Its cells stay empty until the grid is refreshed.
    Failed(TileError),
}

impl TileStatus {
    /// Returns false while the tile is loading.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TileStatus::Pending)
    }
}

/// Everything a grid depends on. Two plans with the same key produce the same grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlanKey {
    pub(crate) anchor: TileId,
    pub(crate) radius: u32,
    pub(crate) source: SourceKey,
    pub(crate) offline: bool,
    pub(crate) cache_root: PathBuf,
}

/// The active grid: its layout plus the status of every tile in it.
#[derive(Debug)]
pub struct GridState {
    plan: GridPlan,
    source: TileSource,
    generation: u64,
    tile_status: HashMap<TileId, TileStatus, ahash::RandomState>,
    complete_emitted: bool,
}

impl GridState {
    pub(crate) fn new(plan: GridPlan, source: TileSource, generation: u64) -> Self {
        let tile_status = plan
            .tiles()
            .into_iter()
            .map(|id| (id, TileStatus::Pending))
            .collect();

        Self {
            plan,
            source,
            generation,
            tile_status,
            complete_emitted: false,
        }
    }

    /// Layout of the grid.
    pub fn plan(&self) -> &GridPlan {
        &self.plan
    }

    /// Tile source of the grid.
    pub fn source(&self) -> &TileSource {
        &self.source
    }

    /// Generation of the grid.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Status of the tile, or `None` if the tile is not part of the grid.
    pub fn status(&self, id: TileId) -> Option<&TileStatus> {
        self.tile_status.get(&id)
    }

    /// Returns true when no tile is loading any more.
    pub fn is_complete(&self) -> bool {
        self.tile_status.values().all(TileStatus::is_terminal)
    }

    /// Number of loaded tiles.
    pub fn loaded_count(&self) -> usize {
        self.tile_status
            .values()
            .filter(|status| matches!(status, TileStatus::Loaded(_)))
            .count()
    }

    /// Number of failed tiles.
    pub fn failed_count(&self) -> usize {
        self.tile_status
            .values()
            .filter(|status| matches!(status, TileStatus::Failed(_)))
            .count()
    }

    /// Raw data of all loaded tiles, in row-major order.
    pub fn loaded_tiles(&self) -> Vec<(TileId, Bytes)> {
        self.plan
            .tiles()
            .into_iter()
            .filter_map(|id| match self.tile_status.get(&id) {
                Some(TileStatus::Loaded(tile)) => Some((id, tile.bytes.clone())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn set_status(&mut self, id: TileId, status: TileStatus) {
        if let Some(current) = self.tile_status.get_mut(&id) {
            *current = status;
        }
    }

    /// Marks the completion as reported. Returns false if it was already reported.
    pub(crate) fn take_completion(&mut self) -> bool {
        if self.complete_emitted || !self.is_complete() {
            return false;
        }

        self.complete_emitted = true;
        true
    }
}
