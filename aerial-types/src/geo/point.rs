use serde::{Deserialize, Serialize};

/// Geographic position reported by a GPS receiver, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct ReferencePoint {
    lat: f64,
    lon: f64,
}

impl ReferencePoint {
    /// Creates a new point from latitude and longitude in degrees.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Latitude in radians.
    pub fn lat_rad(&self) -> f64 {
        self.lat.to_radians()
    }
}

/// Creates a new [`ReferencePoint`] from latitude and longitude values (in degrees).
///
/// ```
/// use aerial_types::latlon;
///
/// let point = latlon!(47.3977, 8.5456);
/// assert_eq!(point.lat(), 47.3977);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        $crate::geo::ReferencePoint::new($lat, $lon)
    };
}
