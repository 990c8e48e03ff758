//! Assessment workflow
//!
//! Scores a provider's patient, persists the result on the patient's
//! profile, and aggregates the provider-facing overview and analytics.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::risk_score::{compute_risk_at, RiskOutput};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Condition, PatientSummary, RiskInput, RiskLabel, User};
use crate::store::Store;
use crate::utils::constants::OVERVIEW_LIST_LEN;

/// Score `input` and apply it to the provider's patient `patient_code`
pub fn assess_patient(
    store: &Store,
    provider: &User,
    patient_code: Option<&str>,
    input: &RiskInput,
) -> AppResult<RiskOutput> {
    let now = Utc::now();
    let result = compute_risk_at(input, now);

    let patient_code = patient_code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("patientId is required"))?;

    let patient_id = store
        .find_patient_for_doctor(&provider.id, patient_code)
        .ok_or_else(|| AppError::not_found("Patient not found for this doctor"))?;

    let record = store.apply_assessment(&patient_id, &provider.id, &result, now)?;

    info!(
        patient_code = %record.patient_code,
        overall_risk = record.overall_risk,
        label = record.status.as_str(),
        condition = record.condition.as_str(),
        "Assessment applied"
    );

    Ok(result)
}

// ============================================
// Provider overview
// ============================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOverview {
    pub total_patients: usize,
    pub high_risk: usize,
    pub assessments_today: usize,
    pub avg_risk_score: u8,
    pub high_risk_patients: Vec<HighRiskPatient>,
    pub recent_assessments: Vec<RecentAssessment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighRiskPatient {
    pub name: String,
    pub id: String,
    pub age: u32,
    pub condition: String,
    pub risk: u8,
    pub tag: RiskLabel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAssessment {
    pub name: String,
    pub assessed_at: String,
    pub level: &'static str,
}

pub fn build_overview(patients: &[PatientSummary], today: NaiveDate) -> ProviderOverview {
    let total = patients.len();
    let high_risk = patients.iter().filter(|p| p.status.is_elevated()).count();

    let today = today.to_string();
    let assessments_today = patients
        .iter()
        .filter(|p| p.last_assessed_at.starts_with(&today))
        .count();

    let avg_risk_score = if total > 0 {
        let sum: u64 = patients.iter().map(|p| p.risk_score as u64).sum();
        (sum as f64 / total as f64).round_ties_even() as u8
    } else {
        0
    };

    let mut by_risk: Vec<&PatientSummary> = patients.iter().collect();
    by_risk.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    let high_risk_patients = by_risk
        .into_iter()
        .take(OVERVIEW_LIST_LEN)
        .filter(|p| p.risk_score > 0)
        .map(|p| HighRiskPatient {
            name: p.name.clone(),
            id: p.id.clone(),
            age: p.age.unwrap_or(0),
            condition: p.condition.clone(),
            risk: p.risk_score,
            tag: p.status,
        })
        .collect();

    let mut by_recency: Vec<&PatientSummary> = patients.iter().collect();
    by_recency.sort_by(|a, b| b.last_assessed_at.cmp(&a.last_assessed_at));
    let recent_assessments = by_recency
        .into_iter()
        .take(OVERVIEW_LIST_LEN)
        .filter(|p| !p.last_assessed_at.is_empty())
        .map(|p| RecentAssessment {
            name: p.name.clone(),
            assessed_at: p.last_assessed_at.clone(),
            level: p.status.level_text(),
        })
        .collect();

    ProviderOverview {
        total_patients: total,
        high_risk,
        assessments_today,
        avg_risk_score,
        high_risk_patients,
        recent_assessments,
    }
}

// ============================================
// Analytics
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub labels: Vec<&'static str>,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAnalytics {
    /// Current status of each assigned patient
    pub risk_level_distribution: Distribution,
    /// Dominant condition of each assessed patient
    pub disease_distribution: Distribution,
    /// Every assessment this process has scored, by label
    pub assessments_by_label: Distribution,
}

pub fn build_analytics(patients: &[PatientSummary], assessments_by_label: [u64; 4]) -> ProviderAnalytics {
    let risk_values = RiskLabel::ALL
        .iter()
        .map(|label| patients.iter().filter(|p| p.status == *label).count() as u64)
        .collect();

    let disease_values = Condition::ALL
        .iter()
        .map(|c| patients.iter().filter(|p| p.condition == c.as_str()).count() as u64)
        .collect();

    let risk_labels = RiskLabel::ALL.iter().map(|l| l.level_label()).collect::<Vec<_>>();

    ProviderAnalytics {
        risk_level_distribution: Distribution {
            labels: risk_labels.clone(),
            values: risk_values,
        },
        disease_distribution: Distribution {
            labels: Condition::ALL.iter().map(|c| c.as_str()).collect(),
            values: disease_values,
        },
        assessments_by_label: Distribution {
            labels: risk_labels,
            values: assessments_by_label.to_vec(),
        },
    }
}
