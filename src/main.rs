use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{info, warn};

use datarun::config::{ElevationBackend, RoutingBackend, expand_path};
use datarun::console::{self, OriginChoice};
use datarun::elevation::ElevationProvider;
use datarun::routing::RouteProvider;
use datarun::{
    Coordinate, DataRunConfig, DataRunError, GoogleDirectionsClient, GoogleElevationClient,
    GraphHopperClient, MadridParksSource, OpenMeteoClient, OpenMeteoElevationClient,
    PersistentCache, ParkStore, RankQuery, RankingPipeline, RankingSettings, export, http, parks,
    telemetry, web,
};

#[derive(Parser)]
#[command(
    name = "datarun",
    version,
    about = "Find the best nearby park for a run",
    long_about = "Ranks the parks around you for a chosen day by weather, distance and walking time."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to ~/.config/datarun/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Recommend a park for a run
    Recommend(RecommendArgs),

    /// Download the Madrid parks dataset into the local catalog
    LoadParks,

    /// Serve the dashboard for the last recommendation
    Serve {
        /// Port override
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct RecommendArgs {
    /// Days from today, 0 is today (asked interactively when omitted)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=7))]
    day: Option<u32>,

    /// Starting latitude
    #[arg(long, requires = "lon", allow_negative_numbers = true, conflicts_with = "place")]
    lat: Option<f64>,

    /// Starting longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Starting place name, resolved through geocoding
    #[arg(long, conflicts_with = "lon")]
    place: Option<String>,

    /// Ignore parks further than this many km
    #[arg(long)]
    max_distance: Option<f64>,

    /// Where to write the candidate table (defaults to dashboard.csv_path)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not prompt; use today and the configured origin for missing values
    #[arg(long, short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = e
                .downcast_ref::<DataRunError>()
                .map_or_else(|| format!("{e:#}"), DataRunError::user_message);
            eprintln!("❌ {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = DataRunConfig::load_from_path(cli.config)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    let _telemetry = telemetry::init(&config.logging)?;
    info!(version = datarun::VERSION, "Starting datarun");

    match cli.command {
        Command::Recommend(args) => recommend(&config, args).await,
        Command::LoadParks => load_parks(&config).await,
        Command::Serve { port } => {
            if let Some(port) = port {
                config.dashboard.port = port;
            }
            web::run(&config.dashboard).await
        }
    }
}

fn open_cache(config: &DataRunConfig) -> Option<Arc<PersistentCache>> {
    if !config.cache.enabled {
        return None;
    }
    let location = expand_path(&config.cache.location);
    match PersistentCache::open(&location) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!("Cache at {} unavailable, continuing without it: {e}", location.display());
            None
        }
    }
}

fn elevation_provider(
    config: &DataRunConfig,
    client: &ClientWithMiddleware,
    cache: Option<Arc<PersistentCache>>,
) -> Arc<dyn ElevationProvider> {
    let base_url = config.elevation.endpoint();
    match config.elevation.backend {
        ElevationBackend::OpenMeteo => {
            Arc::new(OpenMeteoElevationClient::new(client.clone(), base_url, cache))
        }
        ElevationBackend::Google => Arc::new(GoogleElevationClient::new(
            client.clone(),
            base_url,
            config.elevation.api_key.clone().unwrap_or_default(),
            cache,
        )),
    }
}

fn route_provider(
    config: &DataRunConfig,
    client: &ClientWithMiddleware,
    cache: Option<Arc<PersistentCache>>,
) -> Arc<dyn RouteProvider> {
    let base_url = config.routing.endpoint();
    let api_key = config.routing.api_key.clone().unwrap_or_default();
    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 60 * 60);
    match config.routing.backend {
        RoutingBackend::Google => Arc::new(
            GoogleDirectionsClient::new(client.clone(), base_url, api_key, cache).with_cache_ttl(ttl),
        ),
        RoutingBackend::Graphhopper => Arc::new(
            GraphHopperClient::new(client.clone(), base_url, api_key, cache).with_cache_ttl(ttl),
        ),
    }
}

async fn recommend(config: &DataRunConfig, args: RecommendArgs) -> Result<()> {
    config.validate_api_keys()?;

    let client = http::build_client(&config.http)?;
    let cache = open_cache(config);
    let weather = Arc::new(OpenMeteoClient::new(
        client.clone(),
        &config.weather.base_url,
        &config.geocoding.base_url,
        &config.weather.timezone,
    ));
    let catalog = Arc::new(ParkStore::open(expand_path(&config.catalog.path))?);

    let pipeline = RankingPipeline::new(
        RankingSettings::from_config(config)?,
        catalog,
        weather.clone(),
        elevation_provider(config, &client, cache.clone()),
        route_provider(config, &client, cache),
    );

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    let day_offset = match args.day {
        Some(day) => day,
        None if args.yes => 0,
        None => console::prompt_day_offset(&mut input, &mut output, pipeline.target_date(0)?)?,
    };

    let choice = match (args.lat, args.lon, args.place) {
        (Some(lat), Some(lon), _) => OriginChoice::Coordinates(Coordinate::new(lat, lon)),
        (_, _, Some(place)) => OriginChoice::Place(place),
        _ if args.yes => OriginChoice::Default,
        _ => console::prompt_origin(&mut input, &mut output, &config.origin)?,
    };

    let (origin, label) = match choice {
        OriginChoice::Default => (config.origin.coordinate(), config.origin.name.clone()),
        OriginChoice::Coordinates(coordinate) => (coordinate, coordinate.format_coordinates()),
        OriginChoice::Place(name) => {
            let place = weather
                .geocode(&name)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| DataRunError::validation(format!("No place found for '{name}'")))?;
            info!(place = %place.name, "Resolved starting point");
            (place.location, place.name)
        }
    };

    let mut query = RankQuery::new(origin, day_offset);
    if let Some(max_distance) = args.max_distance {
        query = query.with_max_distance(max_distance);
    }
    let max_distance_km = query
        .max_distance_km
        .unwrap_or(pipeline.settings().max_distance_km);

    let result = pipeline.rank(&query).await?;
    console::print_recommendation(&mut output, &result, &label, max_distance_km)?;

    let path = args
        .output
        .unwrap_or_else(|| expand_path(&config.dashboard.csv_path));
    if export::write_candidates(&path, &result.candidates)? {
        println!("📊 Candidate table written to {}", path.display());
    }
    Ok(())
}

async fn load_parks(config: &DataRunConfig) -> Result<()> {
    let client = http::build_client(&config.http)?;
    let source = MadridParksSource::new(
        client,
        &config.catalog.source_url,
        Some(config.catalog.max_parks),
    );
    let path = expand_path(&config.catalog.path);
    let store = ParkStore::open(&path)
        .with_context(|| format!("Failed to open the park store at {}", path.display()))?;

    let count = parks::ingest(&source, &store).await?;
    println!("🌳 Loaded {count} parks into {}", path.display());
    Ok(())
}
