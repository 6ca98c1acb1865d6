//! Documentation of a veterinary clinic backend.
//!
//!
//!
//! # Accounts
//! - Tutors own pets and may sign themselves up
//! - Veterinarians are registered by a manager or administrator
//! - Staff members carry a ladder role: receptionist, manager, administrator
//! - The first administrator comes from the `seed` tool, everyone else through the API
//! - Usernames are unique across all three kinds of account
//!
//!
//!
//! # Medical Records
//! - Anamnesis: veterinarians only
//! - Exams and vaccinations: veterinarians and staff
//! - Consultations: veterinarians only, a recorded weight updates the pet
//! - Sub-records are append-only and numbered per pet
//!
//!
//!
//! # Persistence
//!
//! One JSON array per entity under `DATA_DIR`. Each mutation loads the whole
//! collection, merges the change and rewrites the file, with the previous
//! snapshot kept as `.bak` when `BACKUP_ON_WRITE` is on. A single lock around
//! the store keeps read-modify-write cycles from interleaving.
//!
//!
//!
//! # Setup
//!
//! Seed an administrator.
//! ```sh
//! cargo run -p seed -- --data-dir data --username admin --password 'changeme1' \
//!     --name 'Clinic Admin' --email admin@clinic.test --phone 5511999990000
//! ```
//!
//! Run the server.
//! ```sh
//! RUST_LOG=info cargo run -p clinic
//! ```
//!
//! Environment
//! - `RUST_PORT`: listen port, default 1111
//! - `DATA_DIR`: collection directory, default `data`
//! - `SESSION_TTL_MINUTES`: bearer token lifetime, default 720
//! - `BACKUP_ON_WRITE`: keep `.bak` snapshots, default true
//! - `CORS_MAX_AGE_SECS`: preflight cache, default 3600
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod error;
pub mod roles;
pub mod routes;
pub mod state;
pub mod utils;
pub mod views;

use config::Config;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(state.config.cors_max_age);

    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Opening store at {}", config.data_dir.display());
    let state = AppState::new(config).context("failed to open data directory")?;

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
