//! [`TileId`] addresses a single tile of a slippy map tile pyramid.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Maximum zoom level supported by the tile projection.
pub const MAX_ZOOM: u32 = 19;

/// Index of a tile in the Web-Mercator tile pyramid.
///
/// A tile at zoom `z` has `0 <= x, y < 2^z`. The invariant is checked by [`TileId::new`], so any
/// existing `TileId` refers to a tile that actually exists. Tiles are ordered by zoom, then by row
/// (`y`), then by column (`x`), which is the same order the grid is laid out in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTileId")]
pub struct TileId {
    zoom: u32,
    x: u32,
    y: u32,
}

#[derive(Deserialize)]
struct RawTileId {
    zoom: u32,
    x: u32,
    y: u32,
}

impl TryFrom<RawTileId> for TileId {
    type Error = String;

    fn try_from(RawTileId { zoom, x, y }: RawTileId) -> Result<Self, Self::Error> {
        Self::new(zoom, x, y).ok_or_else(|| format!("tile {zoom}/{x}/{y} does not exist"))
    }
}

impl TileId {
    /// Creates a new tile id.
    ///
    /// Returns `None` if the zoom level is above [`MAX_ZOOM`] or if `x` or `y` do not fit into
    /// the `2^zoom` wide tile matrix.
    ///
    /// ```
    /// use aerial_types::TileId;
    ///
    /// assert!(TileId::new(2, 3, 3).is_some());
    /// assert!(TileId::new(2, 4, 0).is_none());
    /// ```
    pub fn new(zoom: u32, x: u32, y: u32) -> Option<Self> {
        let size = tiles_per_side(zoom)?;
        if x < size && y < size {
            Some(Self { zoom, x, y })
        } else {
            None
        }
    }

    /// Zoom level of the tile.
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Column of the tile, growing eastwards.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row of the tile, growing southwards.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Returns the tile that is `dx` columns and `dy` rows away from this one at the same zoom.
    ///
    /// Columns wrap around the antimeridian. Rows do not wrap: `None` is returned if the target
    /// row is beyond the north or south edge of the projection.
    pub fn offset(&self, dx: i64, dy: i64) -> Option<Self> {
        let size = i64::from(tiles_per_side(self.zoom)?);
        let y = i64::from(self.y) + dy;
        if !(0..size).contains(&y) {
            return None;
        }

        let x = (i64::from(self.x) + dx).rem_euclid(size);
        Some(Self {
            zoom: self.zoom,
            x: x as u32,
            y: y as u32,
        })
    }
}

impl PartialOrd for TileId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TileId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.zoom, self.y, self.x).cmp(&(other.zoom, other.y, other.x))
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one side of the tile matrix at the given zoom level.
pub fn tiles_per_side(zoom: u32) -> Option<u32> {
    if zoom > MAX_ZOOM {
        None
    } else {
        Some(1 << zoom)
    }
}
