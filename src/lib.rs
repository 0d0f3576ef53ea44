//! Pitch Sync - real-time multiplayer football ground
//!
//! The server half is an authoritative ground task behind an axum WebSocket
//! endpoint. The client half ([`client::ClientSim`]) is the per-frame
//! simulation a host drives: local prediction, remote interpolation and
//! authoritative reconciliation.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::game::GroundServer;
use crate::http::build_router;
use crate::util::time::init_server_time;

/// Serve the ground on `listener` until the future is dropped
pub async fn run(listener: TcpListener, config: Config) -> std::io::Result<()> {
    serve(listener, config, std::future::pending()).await
}

/// Serve the ground on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    init_server_time();
    let addr = listener.local_addr()?;

    let (ground, handle) = GroundServer::new(config.tuning(), rand::random());
    tokio::spawn(ground.run());

    let router = build_router(AppState::new(config, handle));

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Initialize tracing/logging; `RUST_LOG` wins over `log_level`
pub fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}
