//! Commands that change how the [`TileGridManager`](crate::grid::TileGridManager) gets its tiles.

use std::path::PathBuf;

/// Command sent to the grid manager with
/// [`TileGridManager::handle_signal`](crate::grid::TileGridManager::handle_signal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// Copy every loaded tile of the current grid into a tile cache in the given folder.
    ///
    /// The folder can later be used with [`ControlSignal::LoadGridFrom`] to show the same area
    /// without network access. When done, [`GridEvent::GridSaved`](crate::event::GridEvent::GridSaved)
    /// is emitted.
    SaveCurrentGrid {
        /// Target folder. Created if it doesn't exist.
        folder: PathBuf,
    },
    /// Use the given folder as the tile cache and switch to offline mode.
    LoadGridFrom {
        /// Cache folder.
        folder: PathBuf,
    },
    /// Turn offline mode on or off.
    SetOffline(bool),
}
