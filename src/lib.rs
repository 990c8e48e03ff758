//! MedPredict Library
//!
//! Medical risk-assessment backend built around a deterministic scoring
//! function that turns a handful of clinical measurements into:
//! - An overall 0-100 risk percentage and a low/moderate/high/critical label
//! - Heart disease, diabetes and hypertension sub-scores
//!
//! The surrounding service lets providers assess their assigned patients and
//! lets patients log health entries and ask the lifestyle assistant.

pub mod api;
pub mod core;
pub mod models;
pub mod store;
pub mod utils;

pub use crate::core::risk_score::{
    compute_risk, compute_risk_at, dominant_condition, RiskFactors, RiskOutput,
};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{
    Condition, DietQuality, ExerciseLevel, RiskInput, RiskLabel, Role, YesNo,
};
pub use store::Store;
pub use utils::telemetry::{AssessmentTelemetry, TelemetryStats};
