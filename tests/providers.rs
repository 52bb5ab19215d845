//! Provider clients against a mock HTTP server

use chrono::NaiveDate;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use datarun::config::HttpConfig;
use datarun::elevation::ElevationProvider;
use datarun::routing::{RouteProvider, route_minutes};
use datarun::weather::WeatherProvider;
use datarun::{
    Coordinate, DataRunError, GoogleDirectionsClient, GoogleElevationClient, GraphHopperClient,
    MadridParksSource, OpenMeteoClient, OpenMeteoElevationClient, ParkCatalog, ParkStore,
    PersistentCache, Provider, http, parks,
};

const SOL: Coordinate = Coordinate::new(40.416_8, -3.703_8);
const RETIRO: Coordinate = Coordinate::new(40.415_3, -3.684_4);

fn client() -> ClientWithMiddleware {
    http::build_client(&HttpConfig {
        timeout_seconds: 5,
        max_retries: 0,
        user_agent: "datarun-test".to_string(),
    })
    .unwrap()
}

fn open_meteo(server: &MockServer) -> OpenMeteoClient {
    OpenMeteoClient::new(
        client(),
        format!("{}/v1", server.uri()),
        format!("{}/geo/v1", server.uri()),
        "Europe/Madrid",
    )
}

#[tokio::test]
async fn test_forecast_request_and_score() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("hourly", "temperature_2m,precipitation"))
        .and(query_param("start_date", "2026-10-20"))
        .and(query_param("end_date", "2026-10-20"))
        .and(query_param("timezone", "Europe/Madrid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": {
                "time": ["2026-10-20T10:00", "2026-10-20T11:00", "2026-10-20T12:00", "2026-10-20T13:00"],
                "temperature_2m": [8.0, 15.0, 26.0, 18.0],
                "precipitation": [0.0, 0.0, 0.4, 3.1]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    let forecast = open_meteo(&server).hourly_forecast(SOL, day).await.unwrap();
    assert_eq!(forecast.temperatures.len(), 4);
    // 1 + 2 + 1 + 0, the last hour is too wet
    assert_eq!(forecast.score().unwrap(), 4);
}

#[tokio::test]
async fn test_forecast_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    let err = open_meteo(&server).hourly_forecast(SOL, day).await.unwrap_err();
    assert!(matches!(
        err,
        DataRunError::ProviderUnavailable {
            provider: Provider::Weather,
            ..
        }
    ));
}

#[tokio::test]
async fn test_forecast_garbage_is_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    let err = open_meteo(&server).hourly_forecast(SOL, day).await.unwrap_err();
    assert!(matches!(err, DataRunError::DataShape { .. }));
}

#[tokio::test]
async fn test_geocode_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/v1/search"))
        .and(query_param("name", "Moncloa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"name": "Moncloa", "latitude": 40.435, "longitude": -3.719, "country": "España"},
                {"name": "Moncloa-Aravaca", "latitude": 40.44, "longitude": -3.74}
            ]
        })))
        .mount(&server)
        .await;

    let places = open_meteo(&server).geocode("Moncloa").await.unwrap();
    assert_eq!(places.len(), 2);
    assert_eq!(places[0].location, Coordinate::new(40.435, -3.719));
    assert_eq!(places[0].country.as_deref(), Some("España"));
    assert_eq!(places[1].country, None);
}

#[tokio::test]
async fn test_open_meteo_elevation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/elevation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elevation": [667.0]})))
        .mount(&server)
        .await;

    let provider = OpenMeteoElevationClient::new(client(), format!("{}/v1", server.uri()), None);
    assert_eq!(provider.elevation(RETIRO).await.unwrap(), Some(667.0));
}

#[tokio::test]
async fn test_google_elevation_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elevation/json"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"elevation": 667.2, "resolution": 9.5}],
            "status": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(PersistentCache::open(dir.path()).unwrap());
    let provider = GoogleElevationClient::new(
        client(),
        format!("{}/elevation", server.uri()),
        "test-key",
        Some(cache),
    );

    assert_eq!(provider.elevation(RETIRO).await.unwrap(), Some(667.2));
    assert_eq!(provider.elevation(RETIRO).await.unwrap(), Some(667.2));
}

#[tokio::test]
async fn test_google_elevation_denied_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elevation/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elevation/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"elevation": 667.2}],
            "status": "OK"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(PersistentCache::open(dir.path()).unwrap());
    let provider = GoogleElevationClient::new(
        client(),
        format!("{}/elevation", server.uri()),
        "test-key",
        Some(cache),
    );

    let err = provider.elevation(RETIRO).await.unwrap_err();
    assert!(matches!(
        err,
        DataRunError::ProviderUnavailable {
            provider: Provider::Elevation,
            ..
        }
    ));
    assert_eq!(provider.elevation(RETIRO).await.unwrap(), Some(667.2));
}

#[tokio::test]
async fn test_google_directions_walking_minutes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/directions/json"))
        .and(query_param("mode", "walking"))
        .and(query_param("origin", "40.4168,-3.7038"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "routes": [{"legs": [{"duration": {"text": "24 mins", "value": 1410}}]}],
            "status": "OK"
        })))
        .mount(&server)
        .await;

    let provider =
        GoogleDirectionsClient::new(client(), format!("{}/directions", server.uri()), "k", None);
    let minutes = route_minutes(&provider, SOL, RETIRO).await.unwrap();
    assert_eq!(minutes, Some(23.5));
}

#[tokio::test]
async fn test_google_directions_no_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/directions/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"routes": [], "status": "ZERO_RESULTS"})),
        )
        .mount(&server)
        .await;

    let provider =
        GoogleDirectionsClient::new(client(), format!("{}/directions", server.uri()), "k", None);
    assert_eq!(provider.walking_seconds(SOL, RETIRO).await.unwrap(), None);
}

#[tokio::test]
async fn test_google_directions_quota_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/directions/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"routes": [], "status": "OVER_QUERY_LIMIT"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/directions/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "routes": [{"legs": [{"duration": {"value": 1410}}]}],
            "status": "OK"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(PersistentCache::open(dir.path()).unwrap());
    let provider = GoogleDirectionsClient::new(
        client(),
        format!("{}/directions", server.uri()),
        "k",
        Some(cache),
    );

    let err = provider.walking_seconds(SOL, RETIRO).await.unwrap_err();
    assert!(matches!(
        err,
        DataRunError::ProviderUnavailable {
            provider: Provider::Routing,
            ..
        }
    ));
    assert_eq!(provider.walking_seconds(SOL, RETIRO).await.unwrap(), Some(1_410));
    // answered routes are cached
    assert_eq!(provider.walking_seconds(SOL, RETIRO).await.unwrap(), Some(1_410));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_graphhopper_foot_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/route"))
        .and(query_param("profile", "foot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paths": [{"distance": 1890.4, "time": 1_409_700}]
        })))
        .mount(&server)
        .await;

    let provider = GraphHopperClient::new(client(), format!("{}/api/1", server.uri()), "k", None);
    assert_eq!(provider.walking_seconds(SOL, RETIRO).await.unwrap(), Some(1_410));
}

#[tokio::test]
async fn test_madrid_ingestion_replaces_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/parques.json"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@graph": [
                {
                    "title": "Parque del Retiro",
                    "address": {"street-address": "PLAZA INDEPENDENCIA 7"},
                    "location": {"latitude": 40.4153, "longitude": -3.6844}
                },
                {"title": "Sin ubicación"},
                {
                    "title": "Casa de Campo",
                    "location": {"latitude": "40.4124", "longitude": "-3.7486"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ParkStore::open(dir.path()).unwrap();
    let source = MadridParksSource::new(client(), format!("{}/parques.json", server.uri()), Some(200));

    let count = parks::ingest(&source, &store).await.unwrap();
    assert_eq!(count, 2);

    let stored = store.parks().await.unwrap();
    assert_eq!(stored[0].name, "Parque del Retiro");
    assert_eq!(stored[1].name, "Casa de Campo");
    assert_eq!(stored[1].location, Coordinate::new(40.4124, -3.7486));
}
