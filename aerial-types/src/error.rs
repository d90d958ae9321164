//! Error type used by the crate.

use thiserror::Error;

/// Error returned when a geographic position cannot be projected onto the tile matrix.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    /// Latitude is outside of the range covered by the Web-Mercator projection.
    #[error("latitude {0} is outside of the projection bounds")]
    InvalidLatitude(f64),
    /// Longitude is not a finite number.
    #[error("longitude {0} is invalid")]
    InvalidLongitude(f64),
    /// Zoom level is above the supported maximum.
    #[error("zoom level {0} is too high")]
    InvalidZoom(u32),
}
