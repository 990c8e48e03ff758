//! Core Module - Business Logic
//!
//! Risk scoring, the provider assessment workflow, accounts, patient
//! trends and the patient assistant.

pub mod accounts;
pub mod assessment;
pub mod assistant;
pub mod risk_score;
pub mod trends;

pub use assessment::*;
pub use risk_score::*;
