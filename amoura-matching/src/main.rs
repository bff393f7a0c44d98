use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod matching;
mod routes;

use config::AppConfig;
use matching::cohorts::CohortFetcher;

pub struct AppState {
    pub config: AppConfig,
    pub cohorts: CohortFetcher,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amoura_shared::middleware::init_tracing("amoura-matching");

    let config = AppConfig::load()?;
    let port = config.port;

    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let cohorts = CohortFetcher::new(http_client, config.user_service_url.clone());

    let state = Arc::new(AppState { config, cohorts });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/matches", get(routes::matches::my_matches))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amoura-matching starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
