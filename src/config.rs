//! Configuration management for `DataRun`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::DataRunError;
use crate::models::Coordinate;

/// Root configuration structure for `DataRun`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataRunConfig {
    /// Forecast API configuration
    pub weather: WeatherConfig,
    /// Place-name search configuration
    pub geocoding: GeocodingConfig,
    /// Elevation provider configuration
    pub elevation: ElevationConfig,
    /// Walking route provider configuration
    pub routing: RoutingConfig,
    /// Shared HTTP client settings
    pub http: HttpConfig,
    /// Park catalog storage and source
    pub catalog: CatalogConfig,
    /// Provider lookup cache
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Ranking tunables
    pub ranking: RankingConfig,
    /// Score weights
    pub scoring: ScoringConfig,
    /// Default starting point
    pub origin: OriginConfig,
    /// Dashboard server
    pub dashboard: DashboardConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// IANA zone used for forecast hours and for "today"
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElevationBackend {
    #[default]
    OpenMeteo,
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationConfig {
    #[serde(default)]
    pub backend: ElevationBackend,
    /// Overrides the backend's default endpoint
    pub base_url: Option<String>,
    /// Required for the Google backend
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingBackend {
    #[default]
    Google,
    Graphhopper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub backend: RoutingBackend,
    /// Overrides the backend's default endpoint
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Park store directory
    #[serde(default = "default_catalog_path")]
    pub path: String,
    /// Open-data dataset the catalog is loaded from
    #[serde(default = "default_catalog_source_url")]
    pub source_url: String,
    /// Maximum number of dataset records to load
    #[serde(default = "default_max_parks")]
    pub max_parks: usize,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// Walking route TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector; spans are only exported when set
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Parks further than this are never considered
    #[serde(default = "default_max_distance")]
    pub max_distance_km: f64,
    /// Parks evaluated at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Budget for each elevation, route or weather call
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_distance_weight")]
    pub distance_weight: f64,
    #[serde(default = "default_route_minutes_divisor")]
    pub route_minutes_divisor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    #[serde(default = "default_origin_latitude")]
    pub latitude: f64,
    #[serde(default = "default_origin_longitude")]
    pub longitude: f64,
    #[serde(default = "default_origin_name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Candidate table written by `recommend` and served by the dashboard
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    /// Front-end assets served for every non-API path
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_timezone() -> String {
    "Europe/Madrid".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_http_timeout() -> u32 {
    20
}

fn default_http_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("datarun/{}", crate::VERSION)
}

fn default_catalog_path() -> String {
    "~/.local/share/datarun/parks".to_string()
}

fn default_catalog_source_url() -> String {
    "https://datos.madrid.es/egob/catalogo/200761-0-parques-jardines.json".to_string()
}

fn default_max_parks() -> usize {
    200
}

fn default_true() -> bool {
    true
}

fn default_cache_location() -> String {
    "~/.cache/datarun".to_string()
}

fn default_cache_ttl() -> u32 {
    168
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Parks further than this (km) are ignored unless configured otherwise
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 15.0;

/// Parks evaluated at the same time unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 4;

pub const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 20;

fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE_KM
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_provider_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECONDS
}

fn default_distance_weight() -> f64 {
    1.0
}

fn default_route_minutes_divisor() -> f64 {
    10.0
}

fn default_origin_latitude() -> f64 {
    40.4168
}

fn default_origin_longitude() -> f64 {
    -3.7038
}

fn default_origin_name() -> String {
    "Puerta del Sol".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_csv_path() -> String {
    "datarun_dashboard.csv".to_string()
}

fn default_static_dir() -> String {
    "dashboard".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timezone: default_timezone(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            backend: ElevationBackend::default(),
            base_url: None,
            api_key: None,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            backend: RoutingBackend::default(),
            base_url: None,
            api_key: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            source_url: default_catalog_source_url(),
            max_parks: default_max_parks(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: default_cache_location(),
            ttl_hours: default_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_distance_km: default_max_distance(),
            concurrency: default_concurrency(),
            provider_timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            distance_weight: default_distance_weight(),
            route_minutes_divisor: default_route_minutes_divisor(),
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            latitude: default_origin_latitude(),
            longitude: default_origin_longitude(),
            name: default_origin_name(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            csv_path: default_csv_path(),
            static_dir: default_static_dir(),
        }
    }
}

impl ElevationConfig {
    /// Configured endpoint, or the backend's public one
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match (&self.base_url, self.backend) {
            (Some(url), _) => url,
            (None, ElevationBackend::OpenMeteo) => "https://api.open-meteo.com/v1",
            (None, ElevationBackend::Google) => "https://maps.googleapis.com/maps/api/elevation",
        }
    }
}

impl RoutingConfig {
    /// Configured endpoint, or the backend's public one
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match (&self.base_url, self.backend) {
            (Some(url), _) => url,
            (None, RoutingBackend::Google) => "https://maps.googleapis.com/maps/api/directions",
            (None, RoutingBackend::Graphhopper) => "https://graphhopper.com/api/1",
        }
    }
}

impl OriginConfig {
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl DataRunConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // DATARUN_RANKING__MAX_DISTANCE_KM=10 overrides ranking.max_distance_km
        builder = builder.add_source(
            Environment::with_prefix("DATARUN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DataRunConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("datarun").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timezone.is_empty() {
            self.weather.timezone = default_timezone();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.catalog.path.is_empty() {
            self.catalog.path = default_catalog_path();
        }
        if self.catalog.source_url.is_empty() {
            self.catalog.source_url = default_catalog_source_url();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.ranking.concurrency == 0 {
            self.ranking.concurrency = 1;
        }
        if self.ranking.provider_timeout_seconds == 0 {
            self.ranking.provider_timeout_seconds = default_provider_timeout();
        }
        if self.dashboard.csv_path.is_empty() {
            self.dashboard.csv_path = default_csv_path();
        }
        if self.elevation.api_key.as_deref() == Some("") {
            self.elevation.api_key = None;
        }
        if self.routing.api_key.as_deref() == Some("") {
            self.routing.api_key = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keyed backends need their key before a recommendation is attempted
    pub fn validate_api_keys(&self) -> Result<()> {
        if self.elevation.backend == ElevationBackend::Google && self.elevation.api_key.is_none() {
            return Err(DataRunError::config(
                "The google elevation backend requires elevation.api_key (or DATARUN_ELEVATION__API_KEY)",
            )
            .into());
        }

        if self.routing.api_key.is_none() {
            return Err(DataRunError::config(
                "Walking routes require routing.api_key (or DATARUN_ROUTING__API_KEY)",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(DataRunError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(DataRunError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.ranking.provider_timeout_seconds > 300 {
            return Err(DataRunError::config("Provider timeout cannot exceed 300 seconds").into());
        }

        if !self.ranking.max_distance_km.is_finite()
            || !(0.0..=500.0).contains(&self.ranking.max_distance_km)
        {
            return Err(DataRunError::config("Maximum distance must be between 0 and 500 km").into());
        }

        if self.ranking.concurrency > 64 {
            return Err(DataRunError::config("Concurrency cannot exceed 64").into());
        }

        if !self.scoring.distance_weight.is_finite() || self.scoring.distance_weight < 0.0 {
            return Err(DataRunError::config("Distance weight must be a non-negative number").into());
        }

        if !self.scoring.route_minutes_divisor.is_finite() || self.scoring.route_minutes_divisor <= 0.0
        {
            return Err(DataRunError::config("Route minutes divisor must be positive").into());
        }

        if self.cache.ttl_hours > 24 * 90 {
            return Err(DataRunError::config("Cache TTL cannot exceed 90 days").into());
        }

        if !self.origin.coordinate().is_valid() {
            return Err(DataRunError::config(format!(
                "Default origin is not a valid coordinate: {}",
                self.origin.coordinate().format_coordinates()
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DataRunError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DataRunError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.weather.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(DataRunError::config(format!(
                "Unknown time zone '{}'",
                self.weather.timezone
            ))
            .into());
        }

        let urls = [
            ("Weather API base URL", self.weather.base_url.as_str()),
            ("Geocoding API base URL", self.geocoding.base_url.as_str()),
            ("Elevation API base URL", self.elevation.endpoint()),
            ("Routing API base URL", self.routing.endpoint()),
            ("Park catalog source URL", self.catalog.source_url.as_str()),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    DataRunError::config(format!("{name} must be a valid HTTP or HTTPS URL")).into(),
                );
            }
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(
                    DataRunError::config("OTLP endpoint must be a valid HTTP or HTTPS URL").into(),
                );
            }
        }

        Ok(())
    }
}

/// Expand a leading `~` to the home directory
#[must_use]
pub fn expand_path(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(path), |home| home.join(rest)),
        None => PathBuf::from(path),
    }
}
