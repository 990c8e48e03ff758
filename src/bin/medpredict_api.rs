//! MedPredict API Server
//!
//! REST API for medical risk scoring, provider assessments and patient
//! self-tracking.
//!
//! Usage:
//!   cargo run --bin medpredict_api
//!
//! Environment:
//!   PORT / MEDPREDICT_PORT   - Server port (default: 8000)
//!   MEDPREDICT_HOST          - Server host (default: 0.0.0.0)
//!   MEDPREDICT_SEED_DEMO     - Load demo accounts with fixed tokens (default: false)
//!   MEDPREDICT_PASSWORD_ROUNDS - PBKDF2 iterations for new passwords (default: 210000)
//!   MEDPREDICT_RATE_LIMIT    - Requests per minute per client (default: 120)
//!   MEDPREDICT_TELEMETRY_DIR - Telemetry export directory (default: ./telemetry)
//!   RUST_LOG                 - Log filter (default: info)

use medpredict::api::{create_router, start_cleanup_task, AppState, RateLimitConfig};
use medpredict::models::config::ServerConfig;
use medpredict::store::{seed, Store};
use medpredict::utils::constants::{API_PREFIX, APP_NAME, APP_VERSION};
use medpredict::AssessmentTelemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    info!("{} API v{}", APP_NAME, APP_VERSION);

    let config = ServerConfig::from_env()?;
    config.log_summary();

    let store = Arc::new(Store::new());
    if config.seed_demo {
        let summary = seed::load_demo(&store)?;
        warn!(
            doctor_code = %summary.doctor_code,
            patients = summary.patient_ids.len(),
            provider_token = seed::DEMO_PROVIDER_TOKEN,
            "Demo accounts ready; do not expose this server publicly"
        );
    } else {
        info!("Demo seeding disabled; accounts are created through /api/auth/signup");
    }

    let telemetry = Arc::new(AssessmentTelemetry::with_config(
        config.telemetry_dir.clone(),
        config.telemetry_buffer,
    ));
    let telemetry_for_shutdown = telemetry.clone();

    let state = Arc::new(
        AppState::new(store, telemetry, RateLimitConfig::from(&config))
            .with_password_rounds(config.password_rounds),
    );

    // Background cleanup task for rate limiter
    start_cleanup_task(state.clone());

    let app = create_router(state);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("{} API listening on http://{}", APP_NAME, addr);
    info!("Health check: http://{}{}/health", addr, API_PREFIX);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, exporting telemetry...");
    let stats = telemetry_for_shutdown.get_stats();
    info!(
        total_assessments = stats.total_assessments,
        elevated_pct = %format!("{:.1}", stats.elevated_share()),
        avg_latency_us = %format!("{:.1}", stats.avg_latency_us),
        "Session statistics"
    );

    match telemetry_for_shutdown.export_stats_json() {
        Ok(path) => info!(path = %path.display(), "Stats exported"),
        Err(e) => warn!(error = %e, "Failed to export stats"),
    }

    info!("{} API shutdown complete", APP_NAME);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
