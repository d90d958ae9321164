/// Reference ellipsoid of a geographic coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    semimajor: f64,
}

impl Datum {
    /// WGS84 ellipsoid used by GPS receivers and by the Web-Mercator tile projection.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
    };

    /// Semi-major axis in meters.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Length of the equator in meters.
    pub fn equator_length(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.semimajor
    }
}
