//! [`MapConfig`] holds the user-facing settings of the tile grid.

use std::path::{Path, PathBuf};

use aerial_types::MAX_ZOOM;
use serde::{Deserialize, Serialize};

use crate::error::AerialError;
use crate::grid::MAX_RADIUS;
use crate::source::UrlTemplate;

/// Tile server used when nothing else is configured.
pub const DEFAULT_SOURCE_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Settings of the tile grid.
///
/// Can be loaded from JSON. Missing fields take their default values:
///
/// ```
/// use aerial::config::MapConfig;
///
/// let config = MapConfig::from_json(r#"{ "zoom": 18, "offline": true }"#)?;
/// assert_eq!(config.zoom, 18);
/// assert_eq!(config.radius, 3);
/// # Ok::<(), aerial::error::AerialError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Url template of the tile server with `{z}`, `{x}` and `{y}` placeholders.
    pub source_template: String,
    /// Zoom level, `0..=19`.
    pub zoom: u32,
    /// Number of tiles from the centre tile to the edge of the grid, `0..=20`.
    pub radius: u32,
    /// Opacity of the tiles, `0.0..=1.0`.
    pub alpha: f32,
    /// Draw the tiles under other geometry.
    pub draw_under: bool,
    /// Never access the network, show only cached tiles.
    pub offline: bool,
    /// Folder of the persistent tile cache.
    pub cache_root: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            source_template: DEFAULT_SOURCE_TEMPLATE.to_string(),
            zoom: 16,
            radius: 3,
            alpha: 0.7,
            draw_under: false,
            offline: false,
            cache_root: PathBuf::from(".tile_cache"),
        }
    }
}

impl MapConfig {
    /// Parses the configuration from a JSON string and validates it.
    pub fn from_json(json: &str) -> Result<Self, AerialError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| AerialError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from a JSON file and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AerialError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Checks all values, returning the error for the first invalid one.
    pub fn validate(&self) -> Result<(), AerialError> {
        UrlTemplate::parse(&self.source_template)?;

        if self.zoom > MAX_ZOOM {
            return Err(AerialError::InvalidZoom(self.zoom));
        }

        if self.radius > MAX_RADIUS {
            return Err(AerialError::InvalidRadius(self.radius));
        }

        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(AerialError::InvalidConfig(format!(
                "alpha must be between 0 and 1, got {}",
                self.alpha
            )));
        }

        if self.cache_root.as_os_str().is_empty() {
            return Err(AerialError::InvalidConfig("cache root is not set".into()));
        }

        Ok(())
    }

    /// Sets the zoom level, clamping it to the supported range.
    pub fn set_zoom(&mut self, zoom: u32) {
        self.zoom = zoom.min(MAX_ZOOM);
    }

    /// Sets the grid radius, clamping it to the supported range.
    pub fn set_radius(&mut self, radius: u32) {
        self.radius = radius.min(MAX_RADIUS);
    }

    /// Sets the tile opacity, clamping it to `0.0..=1.0`. `NaN` is treated as fully opaque.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha.is_nan() {
            1.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
    }
}
