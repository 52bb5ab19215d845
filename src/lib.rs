//! `DataRun` - pick the best nearby park for a run
//!
//! This library provides the park catalog, the weather, elevation and walking
//! route providers, and the ranking pipeline that combines them into a
//! recommendation for a chosen day.

pub mod api;
pub mod cache;
pub mod config;
pub mod console;
pub mod elevation;
pub mod error;
pub mod export;
pub mod http;
pub mod models;
pub mod parks;
pub mod ranking;
pub mod routing;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::DataRunConfig;
pub use elevation::{ElevationProvider, GoogleElevationClient, OpenMeteoElevationClient};
pub use error::{DataRunError, Provider};
pub use models::{Candidate, Coordinate, ElevationCategory, Park, RankingResult};
pub use parks::{MadridParksSource, ParkCatalog, ParkStore};
pub use ranking::{RankQuery, RankingPipeline, RankingSettings, ScoringWeights};
pub use routing::{GoogleDirectionsClient, GraphHopperClient, RouteProvider};
pub use weather::{OpenMeteoClient, WeatherOutlook, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DataRunError>;
