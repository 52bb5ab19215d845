//! Ranking pipeline
//!
//! Scores the day's weather once at the user's origin, loads the catalog,
//! drops parks beyond the distance cutoff and turns every remaining park into
//! a [`Candidate`]. Elevation and route lookups are best-effort: a failed or
//! slow lookup leaves the corresponding field empty. Weather and catalog
//! failures abort the query.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use super::distance::distance_km;
use super::scorer::ScoringWeights;
use crate::Result;
use crate::config::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_DISTANCE_KM, DEFAULT_PROVIDER_TIMEOUT_SECONDS, DataRunConfig,
};
use crate::elevation::{ElevationProvider, classify_elevation};
use crate::error::{DataRunError, Provider};
use crate::models::candidate::Measurements;
use crate::models::{Candidate, Coordinate, Park, RankingResult};
use crate::parks::ParkCatalog;
use crate::routing::{RouteProvider, route_minutes};
use crate::weather::WeatherProvider;

/// Tunables injected into the pipeline at construction
#[derive(Debug, Clone)]
pub struct RankingSettings {
    /// Parks further than this from the origin are never considered
    pub max_distance_km: f64,
    /// Parks evaluated at the same time
    pub concurrency: usize,
    /// Budget for each upstream call
    pub provider_timeout: Duration,
    pub weights: ScoringWeights,
    /// Zone in which "today" is resolved
    pub timezone: Tz,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            concurrency: DEFAULT_CONCURRENCY,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECONDS),
            weights: ScoringWeights::default(),
            timezone: chrono_tz::Europe::Madrid,
        }
    }
}

impl RankingSettings {
    pub fn from_config(config: &DataRunConfig) -> Result<Self> {
        let timezone: Tz = config.weather.timezone.parse().map_err(|_| {
            DataRunError::config(format!("Unknown time zone '{}'", config.weather.timezone))
        })?;
        Ok(Self {
            max_distance_km: config.ranking.max_distance_km,
            concurrency: config.ranking.concurrency,
            provider_timeout: Duration::from_secs(config.ranking.provider_timeout_seconds),
            weights: ScoringWeights {
                distance_weight: config.scoring.distance_weight,
                route_minutes_divisor: config.scoring.route_minutes_divisor,
            },
            timezone,
        })
    }
}

/// One recommendation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankQuery {
    /// Where the run starts
    pub origin: Coordinate,
    /// Calendar days from today, 0 is today
    pub day_offset: u32,
    /// Overrides the configured distance cutoff
    pub max_distance_km: Option<f64>,
}

impl RankQuery {
    #[must_use]
    pub const fn new(origin: Coordinate, day_offset: u32) -> Self {
        Self {
            origin,
            day_offset,
            max_distance_km: None,
        }
    }

    #[must_use]
    pub const fn with_max_distance(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = Some(max_distance_km);
        self
    }
}

pub struct RankingPipeline {
    settings: RankingSettings,
    catalog: Arc<dyn ParkCatalog>,
    weather: Arc<dyn WeatherProvider>,
    elevation: Arc<dyn ElevationProvider>,
    routes: Arc<dyn RouteProvider>,
}

impl RankingPipeline {
    pub fn new(
        settings: RankingSettings,
        catalog: Arc<dyn ParkCatalog>,
        weather: Arc<dyn WeatherProvider>,
        elevation: Arc<dyn ElevationProvider>,
        routes: Arc<dyn RouteProvider>,
    ) -> Self {
        Self {
            settings,
            catalog,
            weather,
            elevation,
            routes,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &RankingSettings {
        &self.settings
    }

    /// Today in the configured zone plus `day_offset` days
    pub fn target_date(&self, day_offset: u32) -> Result<NaiveDate> {
        let today = Utc::now().with_timezone(&self.settings.timezone).date_naive();
        today
            .checked_add_days(Days::new(day_offset.into()))
            .ok_or_else(|| DataRunError::validation(format!("Day offset {day_offset} is out of range")))
    }

    /// Rank the catalog for the query's day
    pub async fn rank(&self, query: &RankQuery) -> Result<RankingResult> {
        let day = self.target_date(query.day_offset)?;
        let max_distance_km = query
            .max_distance_km
            .unwrap_or(self.settings.max_distance_km);
        self.rank_on(query.origin, day, max_distance_km).await
    }

    /// Rank the catalog for an explicit date
    #[instrument(skip(self), fields(lat = origin.latitude, lon = origin.longitude))]
    pub async fn rank_on(
        &self,
        origin: Coordinate,
        day: NaiveDate,
        max_distance_km: f64,
    ) -> Result<RankingResult> {
        if !origin.is_valid() {
            return Err(DataRunError::validation(format!(
                "Coordinates out of range: {}",
                origin.format_coordinates()
            )));
        }
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            return Err(DataRunError::validation(format!(
                "Maximum distance must be a non-negative number of km, got {max_distance_km}"
            )));
        }

        info!(%day, "Fetching weather for the day");
        let weather_score = self.weather_score(origin, day).await?;

        let parks = self.catalog.parks().await?;
        let total = parks.len();
        info!(weather_score, parks = total, "Processing parks");

        let nearby: Vec<(Park, f64)> = parks
            .into_iter()
            .enumerate()
            .filter_map(|(index, park)| {
                let distance = distance_km(origin, park.location);
                debug!("[{}/{}] {} at {:.2} km", index + 1, total, park.name, distance);
                if distance > max_distance_km {
                    debug!(park = %park.name, "Beyond {max_distance_km} km, skipping");
                    None
                } else {
                    Some((park, distance))
                }
            })
            .collect();

        // `buffered` yields in input order, so candidates keep catalog order
        // whatever order the lookups finish in.
        let candidates: Vec<Candidate> = stream::iter(nearby)
            .map(|(park, distance)| self.evaluate(origin, day, park, distance, weather_score))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let best = best_candidate(&candidates).cloned();
        match &best {
            Some(best) => info!(
                park = %best.name,
                score = best.final_score,
                candidates = candidates.len(),
                "Best park found"
            ),
            None => warn!("No parks within {max_distance_km} km"),
        }

        Ok(RankingResult {
            day,
            weather_score,
            candidates,
            best,
        })
    }

    async fn weather_score(&self, origin: Coordinate, day: NaiveDate) -> Result<u32> {
        let forecast = tokio::time::timeout(
            self.settings.provider_timeout,
            self.weather.hourly_forecast(origin, day),
        )
        .await
        .map_err(|_| {
            DataRunError::provider_unavailable(
                Provider::Weather,
                format!("no answer within {:?}", self.settings.provider_timeout),
            )
        })??;
        forecast.score()
    }

    async fn evaluate(
        &self,
        origin: Coordinate,
        day: NaiveDate,
        park: Park,
        distance_km: f64,
        weather_score: u32,
    ) -> Candidate {
        let (elevation, route_minutes) =
            tokio::join!(self.lookup_elevation(&park), self.lookup_route(origin, &park));
        let (elevation, elevation_category) = classify_elevation(elevation);
        let score = self
            .settings
            .weights
            .score(weather_score, distance_km, route_minutes);

        Candidate::new(
            day,
            origin,
            &park,
            Measurements {
                distance_km,
                route_minutes,
                elevation,
                elevation_category,
                weather_score,
                score,
            },
        )
    }

    async fn lookup_elevation(&self, park: &Park) -> Option<f64> {
        match tokio::time::timeout(
            self.settings.provider_timeout,
            self.elevation.elevation(park.location),
        )
        .await
        {
            Ok(Ok(elevation)) => elevation,
            Ok(Err(e)) => {
                warn!(park = %park.name, "Elevation lookup failed: {e}");
                None
            }
            Err(_) => {
                warn!(park = %park.name, "Elevation lookup timed out");
                None
            }
        }
    }

    async fn lookup_route(&self, origin: Coordinate, park: &Park) -> Option<f64> {
        match tokio::time::timeout(
            self.settings.provider_timeout,
            route_minutes(self.routes.as_ref(), origin, park.location),
        )
        .await
        {
            Ok(Ok(minutes)) => minutes,
            Ok(Err(e)) => {
                warn!(park = %park.name, "Route lookup failed: {e}");
                None
            }
            Err(_) => {
                warn!(park = %park.name, "Route lookup timed out");
                None
            }
        }
    }
}

/// First candidate with the highest full-precision score
#[must_use]
pub fn best_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.raw_score() <= current.raw_score() => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElevationCategory;

    fn candidate(name: &str, score: f64) -> Candidate {
        Candidate::new(
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            Coordinate::new(40.416_8, -3.703_8),
            &Park::new(name, None, Coordinate::new(40.42, -3.69)),
            Measurements {
                distance_km: 1.0,
                route_minutes: None,
                elevation: None,
                elevation_category: ElevationCategory::Unknown,
                weather_score: 0,
                score,
            },
        )
    }

    #[test]
    fn test_best_candidate_picks_maximum() {
        let candidates = vec![
            candidate("a", 3.0),
            candidate("b", 9.5),
            candidate("c", 7.0),
        ];
        assert_eq!(best_candidate(&candidates).unwrap().name, "b");
    }

    #[test]
    fn test_best_candidate_keeps_first_on_tie() {
        let candidates = vec![
            candidate("a", 1.0),
            candidate("b", 10.0),
            candidate("c", 10.0),
        ];
        assert_eq!(best_candidate(&candidates).unwrap().name, "b");
    }

    #[test]
    fn test_best_candidate_uses_full_precision() {
        // Both round to 10.0 for display
        let candidates = vec![candidate("a", 9.998), candidate("b", 10.001)];
        assert_eq!(best_candidate(&candidates).unwrap().name, "b");
    }

    #[test]
    fn test_best_candidate_empty() {
        assert!(best_candidate(&[]).is_none());
    }

    #[test]
    fn test_settings_reject_unknown_timezone() {
        let mut config = DataRunConfig::default();
        config.weather.timezone = "Mars/Olympus_Mons".to_string();
        let err = RankingSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, DataRunError::Config { .. }));
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = RankingSettings::from_config(&DataRunConfig::default()).unwrap();
        assert_eq!(settings.max_distance_km, 15.0);
        assert_eq!(settings.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(settings.weights, ScoringWeights::default());
    }

    #[test]
    fn test_default_settings_match_default_config() {
        let from_config = RankingSettings::from_config(&DataRunConfig::default()).unwrap();
        let default = RankingSettings::default();
        assert_eq!(default.concurrency, from_config.concurrency);
        assert_eq!(default.concurrency, 4);
        assert_eq!(default.max_distance_km, from_config.max_distance_km);
        assert_eq!(default.provider_timeout, from_config.provider_timeout);
        assert_eq!(default.timezone, from_config.timezone);
    }
}
