use std::collections::BTreeSet;

use aerial_types::geo::web_mercator::{
    ground_resolution, tile_containing, tile_coords, tile_edge_meters,
};
use aerial_types::geo::ReferencePoint;
use aerial_types::TileId;

use crate::error::AerialError;

/// Largest supported grid radius. A grid of this radius has 41x41 tiles.
pub const MAX_RADIUS: u32 = 20;

/// A single position of the tile grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridCell {
    /// Index of the cell in [`GridPlan::cells`].
    pub index: usize,
    /// Tile shown in the cell. `None` if the cell is beyond the north or south edge of the map.
    pub id: Option<TileId>,
    /// Column offset from the anchor tile, growing eastwards.
    pub column: i32,
    /// Row offset from the anchor tile, growing southwards.
    pub row: i32,
    /// Position of the south-west corner of the cell in meters (east, north), relative to the
    /// reference point.
    pub plane_offset: (f64, f64),
    /// Edge length of the cell in meters.
    pub size_meters: f64,
}

/// Layout of a square grid of tiles centred on the tile containing a reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    anchor: TileId,
    radius: u32,
    fraction: (f64, f64),
    tile_size_meters: f64,
    resolution: f64,
    cells: Vec<GridCell>,
}

/// Builds the grid around the reference point.
///
/// The grid has `2 * radius + 1` tiles on each side, ordered row by row from north to south and
/// from west to east inside a row. The tile containing the reference point (anchor) is in the
/// middle of the grid.
///
/// ```
/// use aerial::grid::plan;
/// use aerial::latlon;
///
/// let plan = plan(&latlon!(47.3977, 8.5456), 19, 2)?;
/// assert_eq!(plan.cells().len(), 25);
/// assert_eq!(plan.anchor_cell().id, Some(plan.anchor()));
/// # Ok::<(), aerial::error::AerialError>(())
/// ```
pub fn plan(reference: &ReferencePoint, zoom: u32, radius: u32) -> Result<GridPlan, AerialError> {
    if radius > MAX_RADIUS {
        return Err(AerialError::InvalidRadius(radius));
    }

    let (x, y) = tile_coords(reference, zoom)?;
    let anchor = tile_containing(reference, zoom)?;
    let fraction = (
        (x - f64::from(anchor.x())).clamp(0.0, 1.0),
        (y - f64::from(anchor.y())).clamp(0.0, 1.0),
    );

    let edge = tile_edge_meters(reference.lat(), zoom);
    let radius_i = radius as i32;
    let side = 2 * radius as usize + 1;

    let mut cells = Vec::with_capacity(side * side);
    for row in -radius_i..=radius_i {
        for column in -radius_i..=radius_i {
            let east = f64::from(column) * edge - fraction.0 * edge;
            let north = -f64::from(row) * edge - (1.0 - fraction.1) * edge;

            cells.push(GridCell {
                index: cells.len(),
                id: anchor.offset(i64::from(column), i64::from(row)),
                column,
                row,
                plane_offset: (east, north),
                size_meters: edge,
            });
        }
    }

    Ok(GridPlan {
        anchor,
        radius,
        fraction,
        tile_size_meters: edge,
        resolution: ground_resolution(reference.lat(), zoom),
        cells,
    })
}

impl GridPlan {
    /// Tile that contains the reference point.
    pub fn anchor(&self) -> TileId {
        self.anchor
    }

    /// Zoom level of the grid.
    pub fn zoom(&self) -> u32 {
        self.anchor.zoom()
    }

    /// Number of tiles from the anchor to the edge of the grid.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of tiles along one side of the grid.
    pub fn side(&self) -> usize {
        2 * self.radius as usize + 1
    }

    /// Position of the reference point inside the anchor tile. `(0, 0)` is the north-west corner,
    /// `(1, 1)` is the south-east corner.
    pub fn fraction(&self) -> (f64, f64) {
        self.fraction
    }

    /// Edge length of a tile in meters.
    pub fn tile_size_meters(&self) -> f64 {
        self.tile_size_meters
    }

    /// Ground resolution at the reference point in meters per pixel.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// All cells of the grid.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Cell of the anchor tile.
    pub fn anchor_cell(&self) -> &GridCell {
        let r = self.radius as usize;
        &self.cells[r * self.side() + r]
    }

    /// Cells showing the given tile.
    pub fn cells_of(&self, id: TileId) -> impl Iterator<Item = &GridCell> + '_ {
        self.cells.iter().filter(move |cell| cell.id == Some(id))
    }

    /// Distinct tiles of the grid, in row-major order.
    pub fn tiles(&self) -> Vec<TileId> {
        self.cells
            .iter()
            .filter_map(|cell| cell.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
