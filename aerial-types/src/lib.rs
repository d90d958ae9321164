//! Value types shared by the aerial map crates: [`TileId`], [`ReferencePoint`](geo::ReferencePoint)
//! and the Web-Mercator tile projection in [`geo::web_mercator`].

pub mod error;
pub mod geo;

mod tile_id;
pub use tile_id::{tiles_per_side, TileId, MAX_ZOOM};
