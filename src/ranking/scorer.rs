//! Composite candidate score

use serde::{Deserialize, Serialize};

/// Trade-off weights between weather, distance and walking time.
///
/// With the defaults a 10-minute walk costs as much as 1 km of distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Penalty per kilometre of straight-line distance
    pub distance_weight: f64,
    /// Walking minutes are divided by this before being subtracted
    pub route_minutes_divisor: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance_weight: 1.0,
            route_minutes_divisor: 10.0,
        }
    }
}

impl ScoringWeights {
    /// Score with these weights; higher is better
    #[must_use]
    pub fn score(&self, weather_score: u32, distance_km: f64, route_minutes: Option<f64>) -> f64 {
        let route_penalty = route_minutes.map_or(0.0, |minutes| minutes / self.route_minutes_divisor);
        f64::from(weather_score) - self.distance_weight * distance_km - route_penalty
    }
}

/// Score with the default weights
#[must_use]
pub fn score(weather_score: u32, distance_km: f64, route_minutes: Option<f64>) -> f64 {
    ScoringWeights::default().score(weather_score, distance_km, route_minutes)
}

/// Round half away from zero to `decimals` places
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_score_with_route() {
        assert_eq!(score(20, 5.0, Some(30.0)), 12.0);
    }

    #[test]
    fn test_score_without_route() {
        assert_eq!(score(20, 5.0, None), 15.0);
    }

    #[test]
    fn test_score_can_go_negative() {
        assert!(score(0, 12.5, Some(150.0)) < 0.0);
    }

    #[test]
    fn test_custom_weights() {
        let weights = ScoringWeights {
            distance_weight: 2.0,
            route_minutes_divisor: 5.0,
        };
        assert_eq!(weights.score(20, 5.0, Some(30.0)), 4.0);
    }

    #[rstest]
    #[case(12.345_6, 2, 12.35)]
    #[case(1.634_91, 2, 1.63)]
    #[case(23.46, 1, 23.5)]
    #[case(-3.148, 2, -3.15)]
    #[case(7.0, 2, 7.0)]
    fn test_round_to(#[case] value: f64, #[case] decimals: i32, #[case] expected: f64) {
        assert_eq!(round_to(value, decimals), expected);
    }
}
