//! Error types used by the crate.

use std::fmt::{Display, Formatter};

use aerial_types::error::ProjectionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aerial error type.
#[derive(Debug, Error)]
pub enum AerialError {
    /// Reference latitude cannot be projected onto the tile matrix.
    #[error("invalid latitude {0}")]
    InvalidLatitude(f64),
    /// Reference longitude is not a finite number.
    #[error("invalid longitude {0}")]
    InvalidLongitude(f64),
    /// Zoom level is out of the supported range.
    #[error("invalid zoom level {0}")]
    InvalidZoom(u32),
    /// Grid radius is out of the supported range.
    #[error("invalid grid radius {0}")]
    InvalidRadius(u32),
    /// Tile source url template is malformed.
    #[error("invalid url template: {0}")]
    InvalidTemplate(String),
    /// Any other invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Failed to connect to the tile server or to read its response.
    #[error("network error: {0}")]
    Network(String),
    /// Tile data is not a decodable image.
    #[error("failed to decode tile image: {0}")]
    Decode(String),
    /// Tile server responded with an error status or with non-image content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Tile is not in the cache, and network access is disabled.
    #[error("tile is not available in offline mode")]
    Offline,
    /// Item not found.
    #[error("item not found")]
    NotFound,
    /// Error reading/writing data to the FS.
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),
    /// Tile loading task was aborted, for example because the transport or the decoder panicked.
    #[error("tile loading task failed: {0}")]
    Internal(String),
}

/// Category of an error, as reported in [`GridEvent::Error`](crate::event::GridEvent::Error).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`AerialError::InvalidLatitude`].
    InvalidLatitude,
    /// See [`AerialError::InvalidLongitude`].
    InvalidLongitude,
    /// See [`AerialError::InvalidZoom`].
    InvalidZoom,
    /// See [`AerialError::InvalidRadius`].
    InvalidRadius,
    /// See [`AerialError::InvalidTemplate`].
    InvalidTemplate,
    /// See [`AerialError::InvalidConfig`].
    InvalidConfig,
    /// See [`AerialError::Network`].
    Network,
    /// See [`AerialError::Decode`].
    Decode,
    /// See [`AerialError::InvalidResponse`].
    InvalidResponse,
    /// See [`AerialError::Offline`].
    Offline,
    /// See [`AerialError::NotFound`].
    NotFound,
    /// See [`AerialError::Io`].
    Io,
    /// See [`AerialError::Internal`].
    Internal,
}

impl AerialError {
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AerialError::InvalidLatitude(_) => ErrorKind::InvalidLatitude,
            AerialError::InvalidLongitude(_) => ErrorKind::InvalidLongitude,
            AerialError::InvalidZoom(_) => ErrorKind::InvalidZoom,
            AerialError::InvalidRadius(_) => ErrorKind::InvalidRadius,
            AerialError::InvalidTemplate(_) => ErrorKind::InvalidTemplate,
            AerialError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            AerialError::Network(_) => ErrorKind::Network,
            AerialError::Decode(_) => ErrorKind::Decode,
            AerialError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            AerialError::Offline => ErrorKind::Offline,
            AerialError::NotFound => ErrorKind::NotFound,
            AerialError::Io(_) => ErrorKind::Io,
            AerialError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<ProjectionError> for AerialError {
    fn from(value: ProjectionError) -> Self {
        match value {
            ProjectionError::InvalidLatitude(lat) => Self::InvalidLatitude(lat),
            ProjectionError::InvalidLongitude(lon) => Self::InvalidLongitude(lon),
            ProjectionError::InvalidZoom(zoom) => Self::InvalidZoom(zoom),
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for AerialError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

#[cfg(feature = "image")]
impl From<image::ImageError> for AerialError {
    fn from(value: image::ImageError) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Failure of a single tile.
///
/// Unlike [`AerialError`] it can be cloned, so that the same failure can be reported to every
/// request that waited for the tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileError {
    /// Category of the failure.
    pub kind: ErrorKind,
    /// Human readable description.
    pub message: String,
}

impl TileError {
    /// Creates a new tile error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<AerialError> for TileError {
    fn from(value: AerialError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl Display for TileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TileError {}
