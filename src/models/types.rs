//! Type definitions for MedPredict
//! Core data structures shared by scoring, storage and the API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::risk_score::RiskOutput;

/// Yes/No flag as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    #[inline]
    pub fn is_yes(self) -> bool {
        matches!(self, YesNo::Yes)
    }
}

/// Self-reported exercise level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseLevel {
    Low,
    Moderate,
    High,
}

/// Self-reported diet quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietQuality {
    Poor,
    Balanced,
    Excellent,
}

/// Structured health input consumed by the scoring function.
///
/// Numeric fields are kept signed so out-of-range values survive
/// deserialization and can be reported by validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskInput {
    pub age: i32,
    pub systolic: i32,
    pub diastolic: i32,
    pub cholesterol: i32,
    pub blood_sugar: i32,
    pub bmi: f64,
    pub smoking: YesNo,
    pub family_history: YesNo,
    pub exercise_level: ExerciseLevel,
    pub diet_quality: DietQuality,
}

/// Coarse risk classification derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLabel {
    /// Threshold step function on the overall score (inclusive lower bounds)
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            RiskLabel::Critical
        } else if score >= 70 {
            RiskLabel::High
        } else if score >= 40 {
            RiskLabel::Moderate
        } else {
            RiskLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "low",
            RiskLabel::Moderate => "moderate",
            RiskLabel::High => "high",
            RiskLabel::Critical => "critical",
        }
    }

    /// Level string shown in the provider's recent assessments feed
    pub fn level_text(&self) -> &'static str {
        match self {
            RiskLabel::High | RiskLabel::Critical => "High Risk",
            RiskLabel::Moderate => "Moderate Risk",
            RiskLabel::Low => "Low Risk",
        }
    }

    /// Capitalized label for chart axes
    pub fn level_label(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Moderate => "Moderate",
            RiskLabel::High => "High",
            RiskLabel::Critical => "Critical",
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLabel::High | RiskLabel::Critical)
    }

    /// Position in `ALL`, used to index per-label counters
    pub fn index(&self) -> usize {
        match self {
            RiskLabel::Low => 0,
            RiskLabel::Moderate => 1,
            RiskLabel::High => 2,
            RiskLabel::Critical => 3,
        }
    }

    pub const ALL: [RiskLabel; 4] = [
        RiskLabel::Low,
        RiskLabel::Moderate,
        RiskLabel::High,
        RiskLabel::Critical,
    ];
}

/// Disease a patient is primarily at risk for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "Heart Disease")]
    HeartDisease,
    Diabetes,
    Hypertension,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::HeartDisease => "Heart Disease",
            Condition::Diabetes => "Diabetes",
            Condition::Hypertension => "Hypertension",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        match self {
            Condition::HeartDisease => 0,
            Condition::Diabetes => 1,
            Condition::Hypertension => 2,
        }
    }

    pub const ALL: [Condition; 3] = [
        Condition::HeartDisease,
        Condition::Diabetes,
        Condition::Hypertension,
    ];
}

/// Rendered condition for profiles that were never assessed
pub const NO_CONDITION: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Provider => "provider",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Great,
    Good,
    Okay,
    Bad,
}

/// Account record
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub doctor_code: Option<String>,
    /// `None` for token-only accounts (demo seed, fixtures)
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub password_hash: Option<String>,
}

/// Self-service registration body.
///
/// Role-specific fields are optional on the wire and checked by
/// validation: providers need specialization and license number,
/// patients need the doctor code they were given.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub role: Role,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub doctor_code: Option<String>,
}

impl SignupRequest {
    /// Account fields for the store; role-foreign fields are dropped
    pub fn to_new_user(&self, password_hash: String) -> NewUser {
        let is_patient = self.role == Role::Patient;
        let is_provider = self.role == Role::Provider;
        NewUser {
            role: self.role,
            full_name: self.full_name.trim().to_string(),
            email: self.email.clone(),
            phone: non_blank(self.phone.as_deref()),
            date_of_birth: self.date_of_birth.filter(|_| is_patient),
            specialization: non_blank(self.specialization.as_deref()).filter(|_| is_provider),
            license_number: non_blank(self.license_number.as_deref()).filter(|_| is_provider),
            password_hash: Some(password_hash),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub role: Role,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Lets a patient without a doctor link one while logging in
    #[serde(default)]
    pub doctor_code: Option<String>,
}

/// Trimmed value, or `None` when missing or blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// User as exposed by `/auth/me`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub doctor_code: Option<String>,
    pub created_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
            name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            date_of_birth: user.date_of_birth,
            specialization: user.specialization.clone(),
            license_number: user.license_number.clone(),
            doctor_code: user.doctor_code.clone(),
            created_at: crate::utils::clock::format_iso(user.created_at),
        }
    }
}

/// Per-patient clinical profile
#[derive(Debug, Clone)]
pub struct PatientProfile {
    pub user_id: String,
    pub seq: u64,
    pub patient_code: String,
    pub gender: Gender,
    pub last_visit: Option<NaiveDate>,
    pub risk_score: u8,
    pub status: RiskLabel,
    pub condition: Option<Condition>,
    pub last_assessment: Option<RiskOutput>,
    pub last_assessed_at: Option<DateTime<Utc>>,
}

impl PatientProfile {
    pub fn new(user_id: String, seq: u64, gender: Gender) -> Self {
        Self {
            user_id,
            seq,
            patient_code: patient_code_for_seq(seq),
            gender,
            last_visit: None,
            risk_score: 0,
            status: RiskLabel::Low,
            condition: None,
            last_assessment: None,
            last_assessed_at: None,
        }
    }

    pub fn condition_str(&self) -> &'static str {
        self.condition.map(|c| c.as_str()).unwrap_or(NO_CONDITION)
    }
}

/// `P001`..`P999`, then `P1000` onwards
pub fn patient_code_for_seq(seq: u64) -> String {
    format!("P{:03}", seq)
}

/// Row in a provider's patient list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Gender,
    pub last_visit: String,
    pub risk_score: u8,
    pub status: RiskLabel,
    pub condition: String,
    pub last_assessed_at: String,
}

/// One applied assessment, kept as history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    #[serde(skip)]
    pub patient_user_id: String,
    pub patient_code: String,
    #[serde(skip)]
    pub provider_user_id: String,
    #[serde(serialize_with = "crate::utils::clock::serialize_iso")]
    pub created_at: DateTime<Utc>,
    pub result: RiskOutput,
    pub condition: Condition,
    pub status: RiskLabel,
    pub overall_risk: u8,
}

/// Logged patient health entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntry {
    pub id: String,
    #[serde(skip)]
    pub patient_user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub tag: String,
    pub recorded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}
