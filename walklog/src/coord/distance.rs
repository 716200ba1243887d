//! Great-circle distance between geographic points.

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Computes the great-circle distance between two points in meters.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_M`].
/// Inputs are not range-checked: coordinates outside ±90°/±180° yield a
/// mathematically defined but meaningless result.
///
/// # Arguments
///
/// * `lat1`, `lon1` - First point in degrees
/// * `lat2`, `lon2` - Second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1.0 near the antipode.
    let a = a.min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Degrees of latitude spanning `meters` along a meridian.
    fn meridian_degrees(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(haversine_distance(35.6812, 139.7671, 35.6812, 139.7671), 0.0);
        assert_eq!(haversine_distance(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree along a meridian is R * pi / 180
        let d = haversine_distance(10.0, 20.0, 11.0, 20.0);
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-6, "got {}, expected {}", d, expected);
    }

    #[test]
    fn test_tokyo_to_osaka() {
        // Tokyo Station to Osaka Station is roughly 403 km as the crow flies
        let d = haversine_distance(35.6812, 139.7671, 34.7025, 135.4959);
        assert!(
            (d - 403_000.0).abs() < 3_000.0,
            "Tokyo-Osaka should be ~403km, got {}m",
            d
        );
    }

    #[test]
    fn test_hundred_meters_along_meridian() {
        let step = meridian_degrees(100.0);
        let d = haversine_distance(35.0, 139.0, 35.0 + step, 139.0);
        assert!((d - 100.0).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_distance_is_symmetric(
                lat1 in -90.0..90.0_f64,
                lon1 in -180.0..180.0_f64,
                lat2 in -90.0..90.0_f64,
                lon2 in -180.0..180.0_f64,
            ) {
                let ab = haversine_distance(lat1, lon1, lat2, lon2);
                let ba = haversine_distance(lat2, lon2, lat1, lon1);
                prop_assert!((ab - ba).abs() < 1e-6, "d(a,b)={} d(b,a)={}", ab, ba);
            }

            #[test]
            fn test_distance_is_non_negative(
                lat1 in -90.0..90.0_f64,
                lon1 in -180.0..180.0_f64,
                lat2 in -90.0..90.0_f64,
                lon2 in -180.0..180.0_f64,
            ) {
                let d = haversine_distance(lat1, lon1, lat2, lon2);
                prop_assert!(d >= 0.0 && d.is_finite(), "distance {} invalid", d);
            }

            #[test]
            fn test_same_point_is_zero(
                lat in -90.0..90.0_f64,
                lon in -180.0..180.0_f64,
            ) {
                prop_assert_eq!(haversine_distance(lat, lon, lat, lon), 0.0);
            }

            #[test]
            fn test_colinear_points_are_additive(
                lat in -80.0..0.0_f64,
                lon in -180.0..180.0_f64,
                d1 in 0.0..5.0_f64,
                d2 in 0.0..5.0_f64,
            ) {
                // Points on one meridian lie on a great circle
                let a = (lat, lon);
                let b = (lat + d1, lon);
                let c = (lat + d1 + d2, lon);

                let ab = haversine_distance(a.0, a.1, b.0, b.1);
                let bc = haversine_distance(b.0, b.1, c.0, c.1);
                let ac = haversine_distance(a.0, a.1, c.0, c.1);

                prop_assert!(
                    (ac - (ab + bc)).abs() < 1e-3,
                    "d(a,c)={} but d(a,b)+d(b,c)={}",
                    ac,
                    ab + bc
                );
            }
        }
    }
}
