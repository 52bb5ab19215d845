//! `OpenMeteo` forecast and geocoding client
//!
//! Neither endpoint needs an API key.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{HourlyForecast, WeatherProvider};
use crate::Result;
use crate::error::{DataRunError, Provider};
use crate::http;
use crate::models::Coordinate;

/// Client for the `OpenMeteo` forecast and geocoding APIs
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
    geocoding_url: String,
    timezone: String,
}

/// A geocoding match
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub name: String,
    pub country: Option<String>,
    pub location: Coordinate,
}

impl OpenMeteoClient {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: impl Into<String>,
        geocoding_url: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            geocoding_url: geocoding_url.into(),
            timezone: timezone.into(),
        }
    }

    /// Look up places matching `name`, best match first
    #[instrument(skip(self))]
    pub async fn geocode(&self, name: &str) -> Result<Vec<GeocodedPlace>> {
        if name.trim().is_empty() {
            return Err(DataRunError::validation("Location cannot be empty"));
        }
        let url = http::endpoint(
            Provider::Geocoding,
            &self.geocoding_url,
            "search",
            &[
                ("name", name.trim().to_string()),
                ("count", "5".to_string()),
                ("language", "es".to_string()),
                ("format", "json".to_string()),
            ],
        )?;

        let response: GeocodingResponse =
            http::get_json(&self.client, Provider::Geocoding, url).await?;

        Ok(response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(GeocodedPlace::from)
            .collect())
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = at.latitude, lon = at.longitude))]
    async fn hourly_forecast(&self, at: Coordinate, date: NaiveDate) -> Result<HourlyForecast> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = http::endpoint(
            Provider::Weather,
            &self.base_url,
            "forecast",
            &[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("hourly", "temperature_2m,precipitation".to_string()),
                ("start_date", day.clone()),
                ("end_date", day),
                ("timezone", self.timezone.clone()),
            ],
        )?;

        let response: ForecastResponse =
            http::get_json(&self.client, Provider::Weather, url).await?;
        let forecast = response.into_hourly_forecast()?;
        debug!(hours = forecast.temperatures.len(), "Received hourly forecast");
        Ok(forecast)
    }
}

/// Forecast response from `OpenMeteo` API
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyData>,
}

/// Hourly weather data from `OpenMeteo`; gaps come back as `null`
#[derive(Debug, Deserialize)]
struct HourlyData {
    #[serde(rename = "temperature_2m")]
    temperature: Option<Vec<Option<f64>>>,
    precipitation: Option<Vec<Option<f64>>>,
}

impl ForecastResponse {
    fn into_hourly_forecast(self) -> Result<HourlyForecast> {
        let hourly = self
            .hourly
            .ok_or_else(|| DataRunError::data_shape(Provider::Weather, "missing hourly block"))?;
        let temperatures = complete_series("temperature_2m", hourly.temperature)?;
        let precipitation = complete_series("precipitation", hourly.precipitation)?;
        Ok(HourlyForecast::new(temperatures, precipitation))
    }
}

fn complete_series(name: &str, series: Option<Vec<Option<f64>>>) -> Result<Vec<f64>> {
    let series = series.ok_or_else(|| {
        DataRunError::data_shape(Provider::Weather, format!("missing hourly {name}"))
    })?;
    series
        .into_iter()
        .enumerate()
        .map(|(hour, value)| {
            value.ok_or_else(|| {
                DataRunError::data_shape(
                    Provider::Weather,
                    format!("hourly {name} has no value for hour {hour}"),
                )
            })
        })
        .collect()
}

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

impl From<GeocodingResult> for GeocodedPlace {
    fn from(result: GeocodingResult) -> Self {
        Self {
            name: result.name,
            country: result.country,
            location: Coordinate::new(result.latitude, result.longitude),
        }
    }
}
