//! Madrid parks and gardens ingestion
//!
//! Extracts the city council's open-data catalog (a JSON-LD document with an
//! `@graph` array), keeps the records that carry a name and coordinates, and
//! loads them into the [`ParkStore`].

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::ParkStore;
use crate::Result;
use crate::error::{DataRunError, Provider};
use crate::http;
use crate::models::{Coordinate, Park};

/// Client for the datos.madrid.es parks dataset
pub struct MadridParksSource {
    client: ClientWithMiddleware,
    url: String,
    max_parks: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(rename = "@graph", default)]
    graph: Vec<RawPark>,
}

#[derive(Debug, Deserialize)]
struct RawPark {
    title: Option<String>,
    address: Option<RawAddress>,
    location: Option<RawLocation>,
}

#[derive(Debug, Deserialize)]
struct RawAddress {
    #[serde(rename = "street-address")]
    street_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    latitude: Option<Value>,
    longitude: Option<Value>,
}

impl MadridParksSource {
    pub fn new(
        client: ClientWithMiddleware,
        url: impl Into<String>,
        max_parks: Option<usize>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            max_parks,
        }
    }

    /// Download the dataset and transform it into parks
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<Vec<Park>> {
        info!("Downloading parks from {}", self.url);
        let url = http::endpoint(Provider::ParkSource, &self.url, "", &[("format", "json".to_string())])?;
        let body: Value = http::get_json(&self.client, Provider::ParkSource, url).await?;
        parse_catalog(body, self.max_parks)
    }
}

/// Transform a raw dataset into parks, keeping at most `max_parks` records
pub fn parse_catalog(body: Value, max_parks: Option<usize>) -> Result<Vec<Park>> {
    let catalog: Catalog = serde_json::from_value(body)
        .map_err(|e| DataRunError::data_shape(Provider::ParkSource, e.to_string()))?;

    let mut raw = catalog.graph;
    if let Some(limit) = max_parks {
        raw.truncate(limit);
    }
    info!("Extracted {} raw records", raw.len());

    let total = raw.len();
    let parks: Vec<Park> = raw.into_iter().filter_map(transform_park).collect();

    let skipped = total - parks.len();
    if skipped > 0 {
        warn!("Skipped {skipped} records without a name or coordinates");
    }
    info!("Transformed {} valid parks", parks.len());
    Ok(parks)
}

fn transform_park(raw: RawPark) -> Option<Park> {
    let name = raw.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    let location = raw.location?;
    let latitude = parse_degrees(location.latitude.as_ref()?)?;
    let longitude = parse_degrees(location.longitude.as_ref()?)?;
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return None;
    }

    let address = raw
        .address
        .and_then(|a| a.street_address)
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    Some(Park::new(name, address, coordinate))
}

/// The dataset mixes JSON numbers and numeric strings
fn parse_degrees(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Replace the stored catalog with a fresh download; returns the park count
pub async fn ingest(source: &MadridParksSource, store: &ParkStore) -> Result<usize> {
    let parks = source.fetch().await?;
    if parks.is_empty() {
        warn!("No parks to load, keeping the stored catalog");
        return Ok(0);
    }
    store.replace_all(&parks).await?;
    Ok(parks.len())
}
