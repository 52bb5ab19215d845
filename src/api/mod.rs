use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::export;
use crate::models::{Candidate, sort_by_score};
use crate::ranking::best_candidate;
use crate::weather::WeatherOutlook;

/// Shared state of the dashboard handlers
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Table written by the last `recommend` run
    pub csv_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiOutlook {
    pub score: u32,
    pub emoji: String,
    pub summary: String,
}

impl From<u32> for ApiOutlook {
    fn from(score: u32) -> Self {
        let outlook = WeatherOutlook::from_score(score);
        Self {
            score,
            emoji: outlook.emoji().to_string(),
            summary: outlook.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMarker {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiBest {
    pub candidate: Candidate,
    pub outlook: ApiOutlook,
    /// User position first, then the park
    pub markers: Vec<ApiMarker>,
}

impl From<Candidate> for ApiBest {
    fn from(candidate: Candidate) -> Self {
        let user = candidate.user_location();
        let park = candidate.park_location();
        Self {
            outlook: ApiOutlook::from(candidate.weather_score),
            markers: vec![
                ApiMarker {
                    label: "You".to_string(),
                    latitude: user.latitude,
                    longitude: user.longitude,
                },
                ApiMarker {
                    label: candidate.name.clone(),
                    latitude: park.latitude,
                    longitude: park.longitude,
                },
            ],
            candidate,
        }
    }
}

pub enum ApiError {
    NoData,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NoData => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "No recommendation available yet. Run `datarun recommend` first."
                })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                error!("Dashboard request failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Failed to read the recommendation table" })),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/candidates", get(get_candidates))
        .route("/best", get(get_best))
        .with_state(Arc::new(state))
}

async fn load(state: &DashboardState) -> Result<Vec<Candidate>, ApiError> {
    let path = state.csv_path.clone();
    if !path.exists() {
        warn!("No table at {}", path.display());
        return Err(ApiError::NoData);
    }

    let candidates = tokio::task::spawn_blocking(move || export::read_candidates(path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if candidates.is_empty() {
        return Err(ApiError::NoData);
    }
    Ok(candidates)
}

async fn get_candidates(
    State(state): State<Arc<DashboardState>>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let mut candidates = load(&state).await?;
    sort_by_score(&mut candidates);
    Ok(Json(candidates))
}

async fn get_best(State(state): State<Arc<DashboardState>>) -> Result<Json<ApiBest>, ApiError> {
    let candidates = load(&state).await?;
    let best = best_candidate(&candidates)
        .cloned()
        .ok_or(ApiError::NoData)?;
    Ok(Json(ApiBest::from(best)))
}
