use axum::{routing::{get, post}, Router, extract::DefaultBodyLimit};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod socket;
mod sync;

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
    pub io: SocketIo,
    pub http_client: reqwest::Client,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amoura_shared::middleware::init_tracing("amoura-messaging");

    let config = AppConfig::load()?;
    let port = config.port;

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

    // Socket.IO layer - io lives in AppState so REST handlers can emit
    let (sio_layer, io) = SocketIo::builder().build_layer();

    let metrics_handle = amoura_shared::middleware::init_metrics();
    let http_client = reqwest::Client::new();
    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        minio,
        io: io.clone(),
        http_client,
        metrics_handle,
    });

    io.ns("/", {
        let state = state.clone();
        move |socket: socketioxide::extract::SocketRef| {
            let state = state.clone();
            async move {
                socket::handlers::on_connect_with_state(socket, state).await;
            }
        }
    });

    // RabbitMQ subscribers
    let deleted_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_account_deleted(deleted_state).await {
            tracing::error!(error = %e, "account.deleted subscriber failed");
        }
    });

    let block_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_block_changed(block_state).await {
            tracing::error!(error = %e, "block.changed subscriber failed");
        }
    });

    let profile_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_profile_updated(profile_state).await {
            tracing::error!(error = %e, "profile.updated subscriber failed");
        }
    });

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Conversations
        .route("/conversations", get(routes::conversations::list_conversations))
        .route("/conversations/open", post(routes::conversations::open_conversation))
        .route("/conversations/:id", get(routes::conversations::get_conversation))
        .route("/conversations/:id/read", post(routes::messages::mark_conversation_read))
        // Messages
        .route("/conversations/:id/messages", get(routes::messages::list_messages).post(routes::messages::send_message))
        .route("/conversations/:id/media", post(routes::messages::send_media)
            .layer(DefaultBodyLimit::max(50 * 1024 * 1024)))
        .route("/messages/:id/read", post(routes::messages::mark_message_read))
        // Unread count
        .route("/unread-count", get(routes::messages::get_unread_count))
        .layer(sio_layer)
        .layer(axum::middleware::from_fn(amoura_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amoura-messaging starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
