//! Aerial keeps a grid of satellite or map tiles loaded around a moving GPS position. It is meant to
//! be used as the data side of a map overlay: the application feeds it GPS fixes, and it reports
//! which tile images to draw and where.
//!
//! # Quick start
//!
//! ```no_run
//! use aerial::config::MapConfig;
//! use aerial::event::GridEvent;
//! use aerial::grid::TileGridManager;
//! use aerial::latlon;
//!
//! # async fn run() -> Result<(), aerial::error::AerialError> {
//! let mut manager = TileGridManager::builder(MapConfig::default())
//!     .with_sink(|event: GridEvent| println!("{event:?}"))
//!     .build()?;
//!
//! manager.update_reference(latlon!(47.3977, 8.5456));
//! manager.wait_until_ready().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`TileGridManager`](grid::TileGridManager) owns the grid. It decides when the grid has to be
//!   rebuilt, starts loading the tiles and tracks their status. Each rebuild starts a new
//!   *generation*, and results of older generations are ignored.
//! * [`plan`](grid::plan) lays out the grid: `(2r + 1)²` tiles centred on the tile containing the
//!   reference point, with the position of every tile in meters relative to that point.
//! * [`TileFetcher`](fetcher::TileFetcher) loads a single tile. It looks into the persistent
//!   [cache](cache) first, and only downloads the tile if it is not there and offline mode is off.
//! * [`GridEvent`](event::GridEvent)s are delivered to an [`EventSink`](event::EventSink) given by
//!   the application. The crate never draws anything itself.
//!
//! # Features
//!
//! * `reqwest` (default) - download tiles with [`ReqwestTransport`](platform::ReqwestTransport).
//! * `image` (default) - decode PNG and JPEG tiles with
//!   [`RasterImageDecoder`](decoded_image::RasterImageDecoder).

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub(crate) mod async_runtime;
pub mod cache;
pub mod config;
pub mod control;
pub mod decoded_image;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod grid;
pub mod platform;
pub mod source;

#[cfg(test)]
mod tests;

pub use aerial_types::geo::ReferencePoint;
pub use aerial_types::{latlon, TileId};
pub use config::MapConfig;
pub use grid::{TileGridManager, TileGridManagerBuilder};

// Reexport aerial_types
pub use aerial_types;
