use axum::routing::{get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod gateway;
mod models;
mod routes;
mod schema;

use config::AppConfig;
use gateway::GatewayClient;
use amoura_shared::clients::rabbitmq::RabbitMQClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub gateway: GatewayClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amoura_shared::middleware::init_tracing("amoura-billing");

    let config = AppConfig::load()?;
    let port = config.port;

    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()?;
    let gateway = GatewayClient::new(
        http_client,
        config.gateway_url.clone(),
        config.gateway_secret_key.clone(),
    );

    let state = Arc::new(AppState { db, config, rabbitmq, gateway });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/plans", get(routes::checkout::list_plans))
        .route("/checkout", post(routes::checkout::create_checkout))
        .route("/checkout/success", get(routes::checkout::checkout_success))
        .route("/subscription", get(routes::checkout::my_subscription))
        .route("/webhook", post(routes::webhook::gateway_webhook))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amoura-billing starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
