//! Great-circle distance on a spherical earth

use crate::models::Coordinate;

/// Mean earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between `a` and `b` in kilometres.
///
/// Rounding can push the haversine term slightly outside `[0, 1]` for
/// coincident or antipodal points; it is clamped before `asin`.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_same_point_is_zero() {
        let sol = Coordinate::new(40.416_8, -3.703_8);
        assert_eq!(distance_km(sol, sol), 0.0);
    }

    #[test]
    fn test_known_distance_in_madrid() {
        // Puerta del Sol to Parque del Retiro, roughly 1.6 km
        let sol = Coordinate::new(40.416_8, -3.703_8);
        let retiro = Coordinate::new(40.415_3, -3.684_4);
        let distance = distance_km(sol, retiro);
        assert!(distance > 1.5 && distance < 1.8, "got {distance}");
    }

    #[test]
    fn test_antipodal_points() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let distance = distance_km(a, b);
        assert!((distance - PI * EARTH_RADIUS_KM).abs() < 1e-6);
        assert!(distance.is_finite());
    }

    #[test]
    fn test_pole_to_pole() {
        let north = Coordinate::new(90.0, 0.0);
        let south = Coordinate::new(-90.0, 0.0);
        assert!((distance_km(north, south) - PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_along_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);
        let expected = EARTH_RADIUS_KM * 1.0_f64.to_radians();
        assert!((distance_km(a, b) - expected).abs() < 1e-9);
    }

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in coordinate(), b in coordinate()) {
            prop_assert!((distance_km(a, b) - distance_km(b, a)).abs() < TOLERANCE);
        }

        #[test]
        fn distance_to_self_is_zero(a in coordinate()) {
            prop_assert!(distance_km(a, a).abs() < TOLERANCE);
        }

        #[test]
        fn distance_is_bounded_by_half_circumference(a in coordinate(), b in coordinate()) {
            let d = distance_km(a, b);
            prop_assert!(d.is_finite());
            prop_assert!((0.0..=PI * EARTH_RADIUS_KM + TOLERANCE).contains(&d));
        }
    }
}
