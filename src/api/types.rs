//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::risk_score::RiskOutput;
use crate::models::errors::AppResult;
use crate::models::types::{
    AssessmentRecord, HealthEntry, Mood, PatientSummary, PublicUser, Role, User,
};
use crate::models::validation::{ensure_finite_range, ensure_range, Validate};

// ============================================
// Requests
// ============================================

/// Provider assessment: the scoring input plus the target patient code
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessRequest {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(flatten)]
    pub input: crate::models::types::RiskInput,
}

impl Validate for AssessRequest {
    fn validate(&self) -> AppResult<()> {
        self.input.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    pub patient_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntryRequest {
    pub systolic: i32,
    pub diastolic: i32,
    pub heart_rate: i32,
    pub blood_sugar: i32,
    pub weight_kg: f64,
    pub sleep_hours: f64,
    pub exercise_minutes: i32,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HealthEntryRequest {
    /// One-line value shown in the entries list
    pub fn summary(&self) -> String {
        format!(
            "BP {}/{}, HR {}, Sugar {}",
            self.systolic, self.diastolic, self.heart_rate, self.blood_sugar
        )
    }
}

impl Validate for HealthEntryRequest {
    fn validate(&self) -> AppResult<()> {
        ensure_range("systolic", self.systolic, 60, 260)?;
        ensure_range("diastolic", self.diastolic, 40, 160)?;
        ensure_range("heartRate", self.heart_rate, 30, 220)?;
        ensure_range("bloodSugar", self.blood_sugar, 40, 600)?;
        ensure_finite_range("weightKg", self.weight_kg, 20.0, 300.0)?;
        ensure_finite_range("sleepHours", self.sleep_hours, 0.0, 24.0)?;
        ensure_range("exerciseMinutes", self.exercise_minutes, 0, 1440)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub time: String,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true, id: None }
    }

    pub fn with_id(id: String) -> Self {
        Self { ok: true, id: Some(id) }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

/// Signup and login both answer with a fresh token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

pub type PatientList = Items<PatientSummary>;
pub type HealthEntryList = Items<HealthEntry>;
/// Newest first
pub type AssessmentHistory = Items<AssessmentRecord>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCodeResponse {
    pub doctor_code: String,
}

/// Public doctor card returned by code lookup
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCard {
    pub doctor_code: Option<String>,
    pub name: String,
    pub specialty: Option<String>,
}

/// Doctor as seen by an assigned patient
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedDoctor {
    pub name: String,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub doctor_code: Option<String>,
}

impl From<&User> for AssignedDoctor {
    fn from(doctor: &User) -> Self {
        Self {
            name: doctor.full_name.clone(),
            specialty: doctor.specialization.clone(),
            license_number: doctor.license_number.clone(),
            doctor_code: doctor.doctor_code.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardUser {
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRisk {
    pub summary: String,
    #[serde(flatten)]
    pub result: RiskOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDashboard {
    pub user: DashboardUser,
    pub patient_code: Option<String>,
    pub doctor: Option<AssignedDoctor>,
    pub latest_risk: Option<LatestRisk>,
    pub recent_entries: Vec<HealthEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: &'static str,
    pub generated_at: String,
}
