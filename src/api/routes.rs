//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{auth_middleware, logging_middleware, rate_limit_middleware};
use crate::utils::constants::{API_PREFIX, REQUEST_TIMEOUT_SECS};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let provider = Router::new()
        .route("/overview", get(handlers::provider_overview))
        .route("/patients", get(handlers::provider_patients))
        .route(
            "/patients/:code/assessments",
            get(handlers::patient_assessment_history),
        )
        .route("/invite-code", get(handlers::invite_code))
        .route("/assign", post(handlers::assign_patient))
        .route("/assess", post(handlers::assess))
        .route("/analytics", get(handlers::analytics));

    let patient = Router::new()
        .route("/dashboard", get(handlers::patient_dashboard))
        .route("/trends", get(handlers::patient_trends))
        .route("/assessments", get(handlers::my_assessments))
        .route(
            "/health-entries",
            get(handlers::list_health_entries).post(handlers::create_health_entry),
        )
        .route("/assistant/chat", post(handlers::assistant_chat));

    // Bearer token required
    let authenticated = Router::new()
        .route("/risk/score", post(handlers::score_risk))
        .route("/auth/me", get(handlers::me))
        .nest("/provider", provider)
        .nest("/patient", patient)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Everything except the health check is rate limited
    let limited = Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/doctor/by-code/:code", get(handlers::doctor_by_code))
        .merge(authenticated)
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(limited);

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(handlers::not_found)
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
}
