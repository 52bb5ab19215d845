//! Weather scoring for running
//!
//! A day's hourly forecast at the user's origin is reduced to a single
//! integer score that is shared by every park evaluated in the same query.

use std::fmt::{self, Display};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::{DataRunError, Provider};
use crate::models::Coordinate;

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

/// Hours with more precipitation than this are void regardless of temperature
pub const HEAVY_RAIN_MM: f64 = 2.0;

/// Points awarded to an hour in the ideal temperature band
pub const IDEAL_HOUR_POINTS: u32 = 2;

/// Hourly temperature and precipitation for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    /// Temperature in Celsius, one entry per hour
    pub temperatures: Vec<f64>,
    /// Precipitation in mm, aligned with `temperatures`
    pub precipitation: Vec<f64>,
}

impl HourlyForecast {
    #[must_use]
    pub const fn new(temperatures: Vec<f64>, precipitation: Vec<f64>) -> Self {
        Self {
            temperatures,
            precipitation,
        }
    }

    pub fn score(&self) -> Result<u32> {
        weather_score(&self.temperatures, &self.precipitation)
    }
}

/// Source of hourly forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Hourly forecast at `at` for the whole of `date`
    async fn hourly_forecast(&self, at: Coordinate, date: NaiveDate) -> Result<HourlyForecast>;
}

/// Score a day's hourly series for running.
///
/// Each dry hour earns 2 points in the 10–24 °C band and 1 point in the
/// 5–10 °C or 24–28 °C shoulders. Hours above [`HEAVY_RAIN_MM`] earn nothing.
pub fn weather_score(temperatures: &[f64], precipitation: &[f64]) -> Result<u32> {
    if temperatures.len() != precipitation.len() {
        return Err(DataRunError::data_shape(
            Provider::Weather,
            format!(
                "hourly series differ in length: {} temperatures, {} precipitation values",
                temperatures.len(),
                precipitation.len()
            ),
        ));
    }

    let score = temperatures
        .iter()
        .zip(precipitation)
        .map(|(&temperature, &rain)| hour_points(temperature, rain))
        .sum();

    Ok(score)
}

fn hour_points(temperature: f64, precipitation: f64) -> u32 {
    if precipitation > HEAVY_RAIN_MM {
        return 0;
    }
    if (10.0..=24.0).contains(&temperature) {
        IDEAL_HOUR_POINTS
    } else if (5.0..10.0).contains(&temperature) || (temperature > 24.0 && temperature <= 28.0) {
        1
    } else {
        0
    }
}

/// Human reading of a weather score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherOutlook {
    /// Score of 30 or more
    VeryGood,
    /// Score of 20 or more
    Good,
    /// Score of 10 or more
    Fair,
    /// Rain or uncomfortable temperatures most of the day
    Poor,
}

impl WeatherOutlook {
    #[must_use]
    pub const fn from_score(score: u32) -> Self {
        match score {
            30.. => WeatherOutlook::VeryGood,
            20..=29 => WeatherOutlook::Good,
            10..=19 => WeatherOutlook::Fair,
            _ => WeatherOutlook::Poor,
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            WeatherOutlook::VeryGood => "🌞",
            WeatherOutlook::Good => "🌤",
            WeatherOutlook::Fair => "🌥",
            WeatherOutlook::Poor => "🌧",
        }
    }
}

impl Display for WeatherOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WeatherOutlook::VeryGood => "very good weather, no significant rain",
            WeatherOutlook::Good => "good weather, some clouds",
            WeatherOutlook::Fair => "fair weather, take care",
            WeatherOutlook::Poor => "poor weather, rain or harsh temperatures",
        };
        write!(f, "{} {text}", self.emoji())
    }
}
