//! JARVI Gateway: REST + WebSocket front for the command bridge.
//!
//! Routes:
//! - `POST /api/command`  free-text command → reply envelope
//! - `POST /api/claude`   secret-gated relay of a message for Claude
//! - `GET  /api/health`   liveness
//! - `GET  /ws`           WebSocket (`user-command` in, `jarvi-response` / `jarvi-broadcast` out)

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use jarvi_core::{Bridge, BridgeConfig};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

fn build_app(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(cors_origin))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api/command", post(handlers::api::command))
        .route("/api/claude", post(handlers::api::claude))
        .route("/api/health", get(handlers::api::health))
        .route("/ws", get(handlers::socket::ws_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, closing gateway");
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[jarvi-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match BridgeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ CONFIG ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let cors_origin = match HeaderValue::from_str(&config.cors_origin) {
        Ok(origin) => origin,
        Err(e) => {
            eprintln!("❌ CONFIG ERROR: invalid cors_origin {:?}: {}", config.cors_origin, e);
            std::process::exit(1);
        }
    };

    let bridge = match Bridge::new(&config) {
        Ok(bridge) => Arc::new(bridge),
        Err(e) => {
            eprintln!("❌ CONFIG ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let app = build_app(AppState::new(bridge), cors_origin);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("❌ Could not bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 JARVI gateway listening on http://{}", addr);
    tracing::info!("📡 WebSocket at ws://{}/ws", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
