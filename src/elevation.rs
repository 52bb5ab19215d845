//! Terrain elevation lookups and classification

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::Result;
use crate::cache::{PersistentCache, jittered_ttl};
use crate::error::Provider;
use crate::http;
use crate::models::{Coordinate, ElevationCategory};

/// Parks below this elevation (m) are flat
pub const FLAT_BELOW_M: f64 = 650.0;

/// Parks below this elevation (m), and not flat, are moderate
pub const MODERATE_BELOW_M: f64 = 750.0;

/// Elevations do not change; keep them for a month
const ELEVATION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Source of terrain elevation
#[async_trait]
pub trait ElevationProvider: Send + Sync {
    /// Elevation in metres at `at`, or `None` when the provider has no data
    async fn elevation(&self, at: Coordinate) -> Result<Option<f64>>;
}

/// Map a raw elevation to its terrain category
#[must_use]
pub fn classify_elevation(elevation_m: Option<f64>) -> (Option<f64>, ElevationCategory) {
    let Some(elevation) = elevation_m else {
        return (None, ElevationCategory::Unknown);
    };
    let category = if elevation < FLAT_BELOW_M {
        ElevationCategory::Flat
    } else if elevation < MODERATE_BELOW_M {
        ElevationCategory::Moderate
    } else {
        ElevationCategory::High
    };
    (Some(elevation), category)
}

/// `OpenMeteo` elevation API, no key required
pub struct OpenMeteoElevationClient {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Option<Arc<PersistentCache>>,
}

impl OpenMeteoElevationClient {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: impl Into<String>,
        cache: Option<Arc<PersistentCache>>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cache,
        }
    }

    async fn fetch(&self, at: Coordinate) -> Result<Option<f64>> {
        let url = http::endpoint(
            Provider::Elevation,
            &self.base_url,
            "elevation",
            &[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
            ],
        )?;
        let response: OpenMeteoElevationResponse =
            http::get_json(&self.client, Provider::Elevation, url).await?;
        Ok(response.elevation.into_iter().flatten().next())
    }
}

#[async_trait]
impl ElevationProvider for OpenMeteoElevationClient {
    #[instrument(skip(self), fields(lat = at.latitude, lon = at.longitude))]
    async fn elevation(&self, at: Coordinate) -> Result<Option<f64>> {
        cached_elevation(self.cache.as_deref(), "open-meteo", at, self.fetch(at)).await
    }
}

/// Google Maps Elevation API
pub struct GoogleElevationClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: Option<Arc<PersistentCache>>,
}

impl GoogleElevationClient {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        cache: Option<Arc<PersistentCache>>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            cache,
        }
    }

    async fn fetch(&self, at: Coordinate) -> Result<Option<f64>> {
        let url = http::endpoint(
            Provider::Elevation,
            &self.base_url,
            "json",
            &[
                ("locations", format!("{},{}", at.latitude, at.longitude)),
                ("key", self.api_key.clone()),
            ],
        )?;
        let response: GoogleElevationResponse =
            http::get_json(&self.client, Provider::Elevation, url).await?;
        http::check_google_status(Provider::Elevation, &response.status)?;
        Ok(response.results.first().map(|r| r.elevation))
    }
}

#[async_trait]
impl ElevationProvider for GoogleElevationClient {
    #[instrument(skip(self), fields(lat = at.latitude, lon = at.longitude))]
    async fn elevation(&self, at: Coordinate) -> Result<Option<f64>> {
        cached_elevation(self.cache.as_deref(), "google", at, self.fetch(at)).await
    }
}

async fn cached_elevation(
    cache: Option<&PersistentCache>,
    backend: &str,
    at: Coordinate,
    fetch: impl Future<Output = Result<Option<f64>>>,
) -> Result<Option<f64>> {
    let key = format!("elevation:{backend}:{}", at.to_key());

    if let Some(cache) = cache {
        match cache.get::<Option<f64>>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!("Elevation cache read failed: {e}"),
        }
    }

    let elevation = fetch.await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.put(&key, elevation, jittered_ttl(ELEVATION_TTL)).await {
            warn!("Elevation cache write failed: {e}");
        }
    }
    Ok(elevation)
}

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    #[serde(default)]
    elevation: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct GoogleElevationResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GoogleElevationResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleElevationResult {
    elevation: f64,
}
