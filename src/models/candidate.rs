//! Scored park candidates and ranking results

use std::fmt::{self, Display};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Coordinate, Park};
use crate::ranking::scorer::round_to;
use crate::weather::WeatherOutlook;

/// Terrain category derived from a park's elevation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevationCategory {
    /// Below 650 m
    Flat,
    /// From 650 m up to 750 m
    Moderate,
    /// 750 m and above
    High,
    /// The elevation provider had no data
    Unknown,
}

impl Display for ElevationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElevationCategory::Flat => "flat",
            ElevationCategory::Moderate => "moderate",
            ElevationCategory::High => "high",
            ElevationCategory::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One park's scored evaluation for a single query.
///
/// Field names double as the header of the exported table, so renaming a
/// field changes the file format read by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub day: NaiveDate,
    pub user_lat: f64,
    pub user_lon: f64,
    pub name: String,
    pub address: Option<String>,
    pub location_lat: f64,
    pub location_lon: f64,
    /// Great-circle distance, 2 decimals
    pub distance_km: f64,
    /// Walking time, 1 decimal
    pub route_minutes: Option<f64>,
    /// Elevation in metres
    pub elevation: Option<f64>,
    pub elevation_category: ElevationCategory,
    pub weather_score: u32,
    /// Composite score, 2 decimals
    pub final_score: f64,
    #[serde(skip)]
    score: f64,
}

/// Measurements gathered for one park before it becomes a [`Candidate`]
#[derive(Debug, Clone, Copy)]
pub struct Measurements {
    pub distance_km: f64,
    pub route_minutes: Option<f64>,
    pub elevation: Option<f64>,
    pub elevation_category: ElevationCategory,
    pub weather_score: u32,
    pub score: f64,
}

impl Candidate {
    /// Build a candidate, rounding the displayed fields and keeping the
    /// full-precision score for comparisons.
    #[must_use]
    pub fn new(day: NaiveDate, user: Coordinate, park: &Park, measurements: Measurements) -> Self {
        Self {
            day,
            user_lat: user.latitude,
            user_lon: user.longitude,
            name: park.name.clone(),
            address: park.address.clone(),
            location_lat: park.location.latitude,
            location_lon: park.location.longitude,
            distance_km: round_to(measurements.distance_km, 2),
            route_minutes: measurements.route_minutes.map(|m| round_to(m, 1)),
            elevation: measurements.elevation,
            elevation_category: measurements.elevation_category,
            weather_score: measurements.weather_score,
            final_score: round_to(measurements.score, 2),
            score: measurements.score,
        }
    }

    /// Full-precision composite score
    #[must_use]
    pub const fn raw_score(&self) -> f64 {
        self.score
    }

    /// Rows read back from an export only carry the rounded score.
    pub(crate) const fn restore_score(&mut self) {
        self.score = self.final_score;
    }

    #[must_use]
    pub const fn user_location(&self) -> Coordinate {
        Coordinate::new(self.user_lat, self.user_lon)
    }

    #[must_use]
    pub const fn park_location(&self) -> Coordinate {
        Coordinate::new(self.location_lat, self.location_lon)
    }

    #[must_use]
    pub fn weather_outlook(&self) -> WeatherOutlook {
        WeatherOutlook::from_score(self.weather_score)
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   🌳 Park:          {}", self.name)?;
        match &self.address {
            Some(address) => writeln!(f, "   📍 Address:       {address}")?,
            None => writeln!(f, "   📍 Address:       -")?,
        }
        writeln!(f, "   📏 Distance:      {:.2} km", self.distance_km)?;
        match self.route_minutes {
            Some(minutes) => writeln!(f, "   🚶 Walking route: {minutes:.1} min")?,
            None => writeln!(f, "   🚶 Walking route: no route found")?,
        }
        match self.elevation {
            Some(elevation) => writeln!(
                f,
                "   ⛰  Elevation:     {elevation:.0} m ({})",
                self.elevation_category
            )?,
            None => writeln!(f, "   ⛰  Elevation:     {}", self.elevation_category)?,
        }
        writeln!(
            f,
            "   🌤  Weather:       {} (score {})",
            self.weather_outlook(),
            self.weather_score
        )?;
        writeln!(f, "   ⭐ Final score:   {:.2}", self.final_score)?;
        write!(f, "   📅 Day:           {}", self.day)
    }
}

/// Outcome of one ranking pass
#[derive(Debug, Clone, PartialEq)]
pub struct RankingResult {
    /// Date the forecast was evaluated for
    pub day: NaiveDate,
    /// Weather score shared by every candidate
    pub weather_score: u32,
    /// Candidates in catalog order
    pub candidates: Vec<Candidate>,
    /// Highest scoring candidate, earliest in catalog order on ties
    pub best: Option<Candidate>,
}

impl RankingResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Order candidates by final score, highest first; ties keep their order
pub fn sort_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.raw_score().total_cmp(&a.raw_score()));
}
