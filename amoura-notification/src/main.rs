use axum::routing::{get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod bucket;
mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use amoura_shared::clients::rabbitmq::RabbitMQClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub http_client: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amoura_shared::middleware::init_tracing("amoura-notification");

    let config = AppConfig::load()?;
    let port = config.port;

    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let http_client = reqwest::Client::new();

    let state = Arc::new(AppState { db, config, rabbitmq, http_client });

    // Spawn event subscribers
    let favorite_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_favorite_events(favorite_state).await {
            tracing::error!(error = %e, "favorite event subscriber failed");
        }
    });

    let shortlist_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_shortlist_events(shortlist_state).await {
            tracing::error!(error = %e, "shortlist event subscriber failed");
        }
    });

    let message_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_message_events(message_state).await {
            tracing::error!(error = %e, "message event subscriber failed");
        }
    });

    let deleted_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_account_deleted(deleted_state).await {
            tracing::error!(error = %e, "account.deleted subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/unread-count", get(routes::notifications::unread_count))
        .route("/notifications/mark-all-read", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", post(routes::notifications::mark_read))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amoura-notification starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
