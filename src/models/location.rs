//! Geographic coordinate model

use serde::{Deserialize, Serialize};

/// A point on the earth in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components lie inside the valid WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Stable key fragment for this coordinate, about 11 m of precision
    #[must_use]
    pub fn to_key(&self) -> String {
        let (lat, lon) = self.rounded_coordinates(4);
        format!("{lat:.4}:{lon:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_key() {
        let puerta_del_sol = Coordinate::new(40.416_8, -3.703_8);
        assert_eq!(puerta_del_sol.to_key(), "40.4168:-3.7038");
    }

    #[test]
    fn test_rounded_coordinates() {
        let coordinate = Coordinate::new(40.418_234, -3.682_456);
        let (lat, lon) = coordinate.rounded_coordinates(2);
        assert_eq!(lat, 40.42);
        assert_eq!(lon, -3.68);
    }

    #[test]
    fn test_validity() {
        assert!(Coordinate::new(40.4, -3.7).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }
}
