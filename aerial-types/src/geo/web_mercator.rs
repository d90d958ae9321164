//! Web-Mercator ("slippy map") tile math.
//!
//! See <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames> for the formulas.

use crate::error::ProjectionError;
use crate::geo::{Datum, ReferencePoint};
use crate::tile_id::{tiles_per_side, TileId};

/// Latitude limit of the Web-Mercator projection in degrees.
pub const MAX_LATITUDE: f64 = 85.0511;

/// Width and height of a single tile in pixels.
pub const TILE_SIZE_PX: u32 = 256;

/// Fractional tile coordinates of a point at the given zoom level.
///
/// The integer part is the tile column/row, the fractional part is the position of the point inside
/// that tile (`0.0` is the west/north edge).
pub fn tile_coords(point: &ReferencePoint, zoom: u32) -> Result<(f64, f64), ProjectionError> {
    let size = tiles_per_side(zoom).ok_or(ProjectionError::InvalidZoom(zoom))?;
    let size = f64::from(size);

    let lat = point.lat();
    if !lat.is_finite() || lat.abs() >= MAX_LATITUDE {
        return Err(ProjectionError::InvalidLatitude(lat));
    }

    let lon = point.lon();
    if !lon.is_finite() {
        return Err(ProjectionError::InvalidLongitude(lon));
    }

    let lon = normalize_lon(lon);
    let lat_rad = point.lat_rad();

    let x = size * (lon + 180.0) / 360.0;
    let y = size * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;

    Ok((x, y))
}

/// Tile that contains the given point at the given zoom level.
///
/// ```
/// use aerial_types::geo::web_mercator::tile_containing;
/// use aerial_types::{latlon, TileId};
///
/// let tile = tile_containing(&latlon!(47.3977, 8.5456), 16)?;
/// assert_eq!(tile, TileId::new(16, 34323, 22944).unwrap());
/// # Ok::<(), aerial_types::error::ProjectionError>(())
/// ```
pub fn tile_containing(point: &ReferencePoint, zoom: u32) -> Result<TileId, ProjectionError> {
    let (x, y) = tile_coords(point, zoom)?;
    let max_index = tiles_per_side(zoom).ok_or(ProjectionError::InvalidZoom(zoom))? - 1;

    let x = (x.floor().max(0.0) as u32).min(max_index);
    let y = (y.floor().max(0.0) as u32).min(max_index);

    TileId::new(zoom, x, y).ok_or(ProjectionError::InvalidZoom(zoom))
}

/// Ground resolution in meters per pixel at the given latitude and zoom level.
pub fn ground_resolution(lat: f64, zoom: u32) -> f64 {
    let top_resolution = Datum::WGS84.equator_length() / f64::from(TILE_SIZE_PX);
    top_resolution * lat.to_radians().cos() / 2f64.powi(zoom as i32)
}

/// Length of a tile edge in meters on the ground at the given latitude and zoom level.
pub fn tile_edge_meters(lat: f64, zoom: u32) -> f64 {
    f64::from(TILE_SIZE_PX) * ground_resolution(lat, zoom)
}

fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    use super::*;
    use crate::latlon;

    #[test]
    fn tile_coords_of_known_point() {
        let (x, y) = tile_coords(&latlon!(47.3977, 8.5456), 19).unwrap();
        assert_relative_eq!(x, 274589.43203555554, epsilon = 1e-6);
        assert_relative_eq!(y, 183553.39675678423, epsilon = 1e-6);

        let (x, y) = tile_coords(&latlon!(0.0, 0.0), 1).unwrap();
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tile_containing_known_point() {
        let point = latlon!(47.3977, 8.5456);
        assert_eq!(
            tile_containing(&point, 19).unwrap(),
            TileId::new(19, 274589, 183553).unwrap()
        );
        assert_eq!(
            tile_containing(&point, 0).unwrap(),
            TileId::new(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_latitude_outside_projection() {
        assert_matches!(
            tile_coords(&latlon!(86.0, 0.0), 10),
            Err(ProjectionError::InvalidLatitude(_))
        );
        assert_matches!(
            tile_coords(&latlon!(-90.0, 0.0), 10),
            Err(ProjectionError::InvalidLatitude(_))
        );
        assert_matches!(
            tile_coords(&latlon!(85.0511, 0.0), 10),
            Err(ProjectionError::InvalidLatitude(_))
        );
        assert_matches!(
            tile_coords(&latlon!(f64::NAN, 0.0), 10),
            Err(ProjectionError::InvalidLatitude(_))
        );
    }

    #[test]
    fn rejects_invalid_longitude_and_zoom() {
        assert_matches!(
            tile_coords(&latlon!(10.0, f64::INFINITY), 10),
            Err(ProjectionError::InvalidLongitude(_))
        );
        assert_matches!(
            tile_coords(&latlon!(10.0, 10.0), 20),
            Err(ProjectionError::InvalidZoom(20))
        );
    }

    #[test]
    fn wraps_longitude() {
        let east = tile_containing(&latlon!(10.0, 180.0), 3).unwrap();
        let west = tile_containing(&latlon!(10.0, -180.0), 3).unwrap();
        assert_eq!(east, west);
        assert_eq!(east.x(), 0);

        let wrapped = tile_containing(&latlon!(10.0, 370.0), 3).unwrap();
        let plain = tile_containing(&latlon!(10.0, 10.0), 3).unwrap();
        assert_eq!(wrapped, plain);
    }

    #[test]
    fn resolution_at_equator() {
        assert_relative_eq!(
            ground_resolution(0.0, 0),
            156543.03392804097,
            epsilon = 1e-6
        );
        assert_relative_eq!(tile_edge_meters(0.0, 1), 20037508.342789244, epsilon = 1e-4);
        assert_relative_eq!(ground_resolution(47.3977, 19), 0.2021118994, epsilon = 1e-6);
    }
}
