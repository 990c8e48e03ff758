//! MedPredict HTTP API Module
//! REST API for risk scoring, provider assessments and patient self-tracking

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use middleware::{start_cleanup_task, RateLimitConfig, RateLimiter};
pub use routes::create_router;
pub use types::*;
