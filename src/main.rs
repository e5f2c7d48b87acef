//! AR Combat Client - headless combat engine for two-player AR laser tag
//!
//! This is the main entry point for the client. It handles:
//! - The feed relay bridge (authoritative snapshots in, notifications out)
//! - The renderer bridge (render frames out, target signals in)
//! - The local tick loop resolving shots, grenades and shields

mod app;
mod config;
mod game;
mod http;
mod util;
mod ws;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::game::{Dispatcher, GameSession, Ledger, RoleAssignment};
use crate::http::build_router;
use crate::util::time::init_client_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize uptime tracking
    init_client_time();

    info!("Starting AR Combat Client");
    info!(
        local_role = %config.local_role,
        ammo_policy = ?config.ammo_policy,
        predict_damage = config.predict_damage,
        "Session configuration"
    );

    // Build the combat session
    let ledger = Ledger::new(&config.loadout, config.ammo_policy);
    let dispatcher = Dispatcher::new(
        RoleAssignment::new(config.local_role),
        ledger,
        config.predict_damage,
    );
    let (session, handle) = GameSession::new(dispatcher);
    let session_task = tokio::spawn(session.run());

    // Create application state
    let state = AppState::new(config.clone(), handle);

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Bridge listening on {}", addr);
    info!("Feed relay endpoint: ws://{}/ws/feed", addr);
    info!("Renderer endpoint: ws://{}/ws/render", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session_task.abort();
    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
