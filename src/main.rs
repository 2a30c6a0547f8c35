use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperdesk::config::Config;
use paperdesk::services::{RandomPolicy, SqliteStore};
use paperdesk::{api, websocket, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Paperdesk server on {}:{}", config.host, config.port);

    let store = Arc::new(match &config.database_path {
        Some(path) => SqliteStore::new(path)?,
        None => SqliteStore::new_in_memory()?,
    });

    let policy = Arc::new(RandomPolicy::new(config.settlement_success_rate));
    let state = AppState::new(config.clone(), store, policy);

    // Start the synthetic price feed
    state
        .price_feed
        .start_simulator(Duration::from_millis(config.price_interval_ms));

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .route("/ws", get(websocket::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Paperdesk server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
