//! Persistent storage of raw tile data.

use aerial_types::TileId;
use bytes::Bytes;

use crate::error::AerialError;
use crate::source::SourceKey;

mod file_cache;
pub use file_cache::FileTileCache;

/// Persistent cache of raw (encoded) tiles, keyed by tile id and the source the tile came from.
///
/// Implementations must be safe to call from several threads at once for different tiles.
pub trait TileCache: Send + Sync {
    /// Returns true if the cache has an entry for the tile.
    fn has(&self, id: &TileId, source: &SourceKey) -> bool;

    /// Loads the tile data. Returns [`AerialError::NotFound`] if there is no entry for the tile.
    fn load(&self, id: &TileId, source: &SourceKey) -> Result<Bytes, AerialError>;

    /// Stores the tile data, replacing the existing entry if any.
    fn store(&self, id: &TileId, source: &SourceKey, data: &Bytes) -> Result<(), AerialError>;
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl TileCache for NoCache {
    fn has(&self, _id: &TileId, _source: &SourceKey) -> bool {
        false
    }

    fn load(&self, _id: &TileId, _source: &SourceKey) -> Result<Bytes, AerialError> {
        Err(AerialError::NotFound)
    }

    fn store(&self, _id: &TileId, _source: &SourceKey, _data: &Bytes) -> Result<(), AerialError> {
        Ok(())
    }
}
