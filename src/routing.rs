//! Walking route lookups between the user and a park

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::Result;
use crate::cache::{PersistentCache, jittered_ttl};
use crate::error::Provider;
use crate::http;
use crate::models::Coordinate;

const ROUTE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Source of walking routes
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Walking time in seconds, or `None` when there is no viable route
    async fn walking_seconds(&self, origin: Coordinate, destination: Coordinate)
    -> Result<Option<u64>>;
}

/// Walking time in minutes between two points, `None` when there is no route
pub async fn route_minutes(
    provider: &dyn RouteProvider,
    origin: Coordinate,
    destination: Coordinate,
) -> Result<Option<f64>> {
    let seconds = provider.walking_seconds(origin, destination).await?;
    Ok(seconds.map(|s| s as f64 / 60.0))
}

/// Google Directions API in walking mode
pub struct GoogleDirectionsClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

impl GoogleDirectionsClient {
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
            cache_ttl: ROUTE_TTL,
        }
    }

    /// How long looked-up routes stay cached
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    async fn get_travel_time_call(
        &self,
        source: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<u64>> {
        let url = http::endpoint(
            Provider::Routing,
            &self.base_url,
            "json",
            &[
                ("origin", format!("{},{}", source.latitude, source.longitude)),
                (
                    "destination",
                    format!("{},{}", destination.latitude, destination.longitude),
                ),
                ("mode", "walking".to_string()),
                ("key", self.api_key.clone()),
            ],
        )?;
        let response: DirectionsResponse =
            http::get_json(&self.client, Provider::Routing, url).await?;
        http::check_google_status(Provider::Routing, &response.status)?;

        Ok(response
            .routes
            .first()
            .and_then(|route| route.legs.first())
            .map(|leg| leg.duration.value))
    }
}

#[async_trait]
impl RouteProvider for GoogleDirectionsClient {
    #[instrument(skip(self))]
    async fn walking_seconds(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<u64>> {
        cached_travel_time(
            self.cache.as_deref(),
            self.cache_ttl,
            "google",
            origin,
            destination,
            self.get_travel_time_call(origin, destination),
        )
        .await
    }
}

/// GraphHopper routing API with the `foot` profile
pub struct GraphHopperClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

impl GraphHopperClient {
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
            cache_ttl: ROUTE_TTL,
        }
    }

    /// How long looked-up routes stay cached
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    async fn get_travel_time_call(
        &self,
        source: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<u64>> {
        let url = http::endpoint(
            Provider::Routing,
            &self.base_url,
            "route",
            &[
                ("point", format!("{},{}", source.latitude, source.longitude)),
                (
                    "point",
                    format!("{},{}", destination.latitude, destination.longitude),
                ),
                ("profile", "foot".to_string()),
                ("points_encoded", "false".to_string()),
                ("calc_points", "false".to_string()),
                ("key", self.api_key.clone()),
            ],
        )?;
        let response: ApiResponse = http::get_json(&self.client, Provider::Routing, url).await?;

        Ok(response.paths.first().map(|path| millis_to_seconds(path.time)))
    }
}

/// Whole seconds, rounded half up
fn millis_to_seconds(millis: u64) -> u64 {
    millis.saturating_add(500) / 1000
}

#[async_trait]
impl RouteProvider for GraphHopperClient {
    #[instrument(skip(self))]
    async fn walking_seconds(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<u64>> {
        cached_travel_time(
            self.cache.as_deref(),
            self.cache_ttl,
            "graphhopper",
            origin,
            destination,
            self.get_travel_time_call(origin, destination),
        )
        .await
    }
}

async fn cached_travel_time(
    cache: Option<&PersistentCache>,
    ttl: Duration,
    backend: &str,
    source: Coordinate,
    destination: Coordinate,
    call: impl Future<Output = Result<Option<u64>>>,
) -> Result<Option<u64>> {
    let key = format!(
        "route:{backend}:{}-{}",
        source.to_key(),
        destination.to_key()
    );

    if let Some(cache) = cache {
        match cache.get::<Option<u64>>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!("Route cache read failed: {e}"),
        }
    }

    let seconds = call.await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.put(&key, seconds, jittered_ttl(ttl)).await {
            warn!("Route cache write failed: {e}");
        }
    }
    Ok(seconds)
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    duration: DirectionsValue,
}

#[derive(Debug, Deserialize)]
struct DirectionsValue {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct PathResponse {
    time: u64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    paths: Vec<PathResponse>,
}
