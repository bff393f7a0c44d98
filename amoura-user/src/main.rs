use axum::{routing::{get, post, delete}, Router, extract::DefaultBodyLimit};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::pg::PgConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use amoura_shared::clients::minio::MinioClient;
use amoura_shared::clients::rabbitmq::RabbitMQClient;
use amoura_shared::clients::redis::RedisClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub minio: MinioClient,
    pub http_client: reqwest::Client,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amoura_shared::middleware::init_tracing("amoura-user");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;

    let metrics_handle = amoura_shared::middleware::init_metrics();
    let http_client = reqwest::Client::new();

    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        minio,
        http_client,
        metrics_handle,
    });

    // Spawn RabbitMQ subscribers
    let sub_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_user_registered(sub_state).await {
            tracing::error!(error = %e, "user.registered subscriber failed");
        }
    });

    let plan_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_subscription_activated(plan_state).await {
            tracing::error!(error = %e, "subscription.activated subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Profile
        .route("/me", get(routes::profile::get_profile)
            .patch(routes::profile::update_profile)
            .delete(routes::profile::delete_account))
        .route("/onboarding", post(routes::profile::complete_onboarding))
        .route("/members/:member_ref", get(routes::profile::get_public_profile))
        .route("/search", get(routes::search::search_members))
        // Favorites
        .route("/favorites", post(routes::favorites::add_favorite).get(routes::favorites::list_favorites))
        .route("/favorites/incoming", get(routes::favorites::list_incoming_favorites))
        .route("/favorites/:member_ref", delete(routes::favorites::remove_favorite))
        // Shortlists
        .route("/shortlists", post(routes::shortlists::add_shortlist).get(routes::shortlists::list_shortlists))
        .route("/shortlists/bulk", post(routes::shortlists::add_shortlists_bulk))
        .route("/shortlists/:member_ref", delete(routes::shortlists::remove_shortlist))
        // Blocks
        .route("/blocks/toggle", post(routes::blocks::toggle_block))
        .route("/blocks", get(routes::blocks::list_blocks))
        // Photos
        .route("/photo", post(routes::photo::upload_photo)
            .layer(DefaultBodyLimit::max(10 * 1024 * 1024)))
        // Internal service-to-service endpoints (no auth)
        .route("/internal/presence", post(routes::internal::update_presence))
        .route("/internal/profiles/batch", post(routes::internal::batch_profiles))
        .route("/internal/blocks/pair", get(routes::internal::pair_block_status))
        .route("/internal/discover/:member_ref", get(routes::internal::discover_candidates))
        .route("/internal/attrs/:member_ref", get(routes::internal::viewer_attrs))
        .route("/internal/cohorts/:member_ref", get(routes::internal::cohort_lists))
        .layer(axum::middleware::from_fn(amoura_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amoura-user starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
