//! Coordinate math module
//!
//! Provides great-circle distances between geographic coordinates and the
//! conversion from latitude/longitude to Web Mercator (slippy-map) tile keys
//! used to mark explored areas.

mod distance;
mod types;

pub use distance::{haversine_distance, EARTH_RADIUS_M};
pub use types::{TileKey, TileKeyParseError, DEFAULT_TILE_ZOOM, MAX_MERCATOR_LAT};

use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Converts geographic coordinates to the key of the tile containing them.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
/// * `zoom` - Zoom level (17 is the default for explored tiles)
///
/// # Polar latitudes
///
/// The Mercator projection diverges towards ±90°. Inputs beyond
/// [`MAX_MERCATOR_LAT`] are not clamped and yield keys outside the grid;
/// check [`TileKey::is_within_bounds`] before trusting them.
#[inline]
pub fn to_tile_key(lat: f64, lon: f64, zoom: u8) -> TileKey {
    // Calculate number of tiles at this zoom level
    let n = 2.0_f64.powi(zoom as i32);

    let x = ((lon + 180.0) / 360.0 * n).floor() as i64;

    // ln(tan φ + sec φ) is the Mercator-projected latitude
    let lat_rad = lat * PI / 180.0;
    let mercator = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln();
    let y = ((1.0 - mercator / PI) / 2.0 * n).floor() as i64;

    TileKey { zoom, x, y }
}

/// Converts a tile key back to the geographic coordinates of its center.
///
/// Returns `(latitude, longitude)` in degrees.
#[inline]
pub fn tile_center(tile: &TileKey) -> (f64, f64) {
    let n = tile.tiles_per_axis();

    let lon = (tile.x as f64 + 0.5) / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = (tile.y as f64 + 0.5) / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Collects the unique tile keys visited by a sequence of points.
///
/// Points are `(latitude, longitude)` pairs in degrees. The result is ordered
/// and de-duplicated, ready to be upserted as explored tiles.
pub fn explored_tiles<I>(points: I, zoom: u8) -> BTreeSet<TileKey>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    points
        .into_iter()
        .map(|(lat, lon)| to_tile_key(lat, lon, zoom))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Degrees of latitude spanning `meters` along a meridian.
    fn meridian_degrees(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let key = to_tile_key(40.7128, -74.0060, 16);
        assert_eq!(key, TileKey::new(16, 19295, 24640));
        assert_eq!(key.to_string(), "16/19295/24640");
    }

    #[test]
    fn test_tokyo_station_at_default_zoom() {
        let key = to_tile_key(35.6812, 139.7671, DEFAULT_TILE_ZOOM);
        assert_eq!(key.to_string(), "17/116423/51613");
    }

    #[test]
    fn test_southern_hemisphere() {
        // Sydney
        let key = to_tile_key(-33.8688, 151.2093, 17);
        assert_eq!(key, TileKey::new(17, 120589, 78655));
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        assert_eq!(to_tile_key(35.6812, 139.7671, 0), TileKey::new(0, 0, 0));
        assert_eq!(to_tile_key(-60.0, -170.0, 0), TileKey::new(0, 0, 0));
    }

    #[test]
    fn test_polar_latitude_falls_outside_grid() {
        let north = to_tile_key(89.9, 0.0, 17);
        let south = to_tile_key(-89.9, 0.0, 17);
        assert!(north.y < 0, "north pole key should be above the grid");
        assert!(!north.is_within_bounds());
        assert!(!south.is_within_bounds());
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = to_tile_key(35.6812, 139.7671, 17);
        let b = to_tile_key(35.6812, 139.7671, 17);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_points_five_meters_apart_share_tile() {
        let key = to_tile_key(35.6812, 139.7671, 17);
        let (lat, lon) = tile_center(&key);
        let offset = meridian_degrees(2.5);

        let a = to_tile_key(lat - offset, lon, 17);
        let b = to_tile_key(lat + offset, lon, 17);
        assert_eq!(a, b);
        assert_eq!(a, key);
    }

    #[test]
    fn test_points_five_km_apart_differ() {
        let a = to_tile_key(35.6812, 139.7671, 17);
        let b = to_tile_key(35.6812 + meridian_degrees(5_000.0), 139.7671, 17);
        assert_ne!(a, b);
    }

    #[test]
    fn test_tile_center_roundtrip() {
        let key = to_tile_key(35.6812, 139.7671, 17);
        let (lat, lon) = tile_center(&key);
        assert!((lat - 35.6807).abs() < 0.001, "lat {}", lat);
        assert!((lon - 139.7667).abs() < 0.001, "lon {}", lon);
        assert_eq!(to_tile_key(lat, lon, 17), key);
    }

    #[test]
    fn test_explored_tiles_deduplicates() {
        let key = to_tile_key(35.6812, 139.7671, 17);
        let (lat, lon) = tile_center(&key);
        let far = meridian_degrees(1_000.0);

        let points = vec![
            (lat, lon),
            (lat + 0.00001, lon),
            (lat, lon + 0.00001),
            (lat + far, lon),
        ];

        let tiles = explored_tiles(points, 17);
        assert_eq!(tiles.len(), 2);
        assert!(tiles.contains(&key));
    }

    #[test]
    fn test_explored_tiles_empty() {
        assert!(explored_tiles(Vec::new(), 17).is_empty());
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_key_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=20
            ) {
                let key = to_tile_key(lat, lon, zoom);
                prop_assert!(key.is_within_bounds(), "{} out of bounds", key);
                prop_assert_eq!(key.zoom, zoom);
            }

            #[test]
            fn test_tile_key_deterministic(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=20
            ) {
                prop_assert_eq!(to_tile_key(lat, lon, zoom), to_tile_key(lat, lon, zoom));
            }

            #[test]
            fn test_tile_key_string_roundtrip(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=20
            ) {
                let key = to_tile_key(lat, lon, zoom);
                let parsed: TileKey = key.to_string().parse().unwrap();
                prop_assert_eq!(parsed, key);
            }

            #[test]
            fn test_center_maps_back_to_tile(
                lat in -85.0..85.0_f64,
                lon in -179.9..179.9_f64,
                zoom in 0u8..=18
            ) {
                let key = to_tile_key(lat, lon, zoom);
                let (c_lat, c_lon) = tile_center(&key);
                prop_assert_eq!(to_tile_key(c_lat, c_lon, zoom), key);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lon1 in -180.0..-90.0_f64,
                lon2 in -90.0..0.0_f64,
                zoom in 10u8..=17
            ) {
                let a = to_tile_key(lat, lon1, zoom);
                let b = to_tile_key(lat, lon2, zoom);
                prop_assert!(a.x < b.x, "lon {} (x {}) >= lon {} (x {})", lon1, a.x, lon2, b.x);
            }
        }
    }
}
