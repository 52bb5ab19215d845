use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::{self, DashboardState};
use crate::config::{DashboardConfig, expand_path};

/// Dashboard application: JSON API under `/api`, static front-end elsewhere
pub fn app(config: &DashboardConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = DashboardState {
        csv_path: expand_path(&config.csv_path),
    };

    Router::new()
        .nest("/api", api::router(state))
        .fallback_service(ServeDir::new(expand_path(&config.static_dir)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(config: &DashboardConfig) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Dashboard running at http://{addr}");

    axum::serve(listener, app(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Dashboard server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down dashboard");
}
