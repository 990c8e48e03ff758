//! Risk Scoring Module
//! Deterministic overall and per-disease risk scores (0-100)
//!
//! Every clinical measurement is first normalized to a factor in [0, 1]
//! relative to a reference range. The factors are blended with fixed
//! weights and pushed through a logistic curve:
//! - 0-39: Low
//! - 40-69: Moderate
//! - 70-84: High
//! - 85-100: Critical
//!
//! All percentages are rounded half to even.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::types::{Condition, DietQuality, ExerciseLevel, RiskInput, RiskLabel};

// ============================================
// Overall score weights
// ============================================

const W_AGE: f64 = 1.15;
const W_BP: f64 = 1.35;
const W_CHOL: f64 = 1.05;
const W_SUGAR: f64 = 1.10;
const W_BMI: f64 = 0.95;
const W_SMOKE: f64 = 0.60;
const W_FAMILY: f64 = 0.55;
const W_EXERCISE: f64 = 0.45;
const W_DIET: f64 = 0.35;

const OVERALL_OFFSET: f64 = 2.2;
const OVERALL_STEEPNESS: f64 = 2.1;

/// Risk score result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskOutput {
    pub overall_risk: u8,
    pub label: RiskLabel,
    pub heart_disease: u8,
    pub diabetes: u8,
    pub hypertension: u8,
    #[serde(serialize_with = "crate::utils::clock::serialize_iso")]
    pub generated_at: DateTime<Utc>,
}

impl RiskOutput {
    /// Highest-scoring condition for this result
    pub fn dominant_condition(&self) -> Condition {
        dominant_condition(self.heart_disease, self.diabetes, self.hypertension)
    }
}

/// Normalized risk factors, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskFactors {
    pub age: f64,
    pub blood_pressure: f64,
    pub cholesterol: f64,
    pub blood_sugar: f64,
    pub bmi: f64,
    pub smoking: f64,
    pub family_history: f64,
    pub exercise: f64,
    pub diet: f64,
}

impl RiskFactors {
    pub fn from_input(input: &RiskInput) -> Self {
        let systolic = (input.systolic as f64 - 110.0) / 60.0;
        let diastolic = (input.diastolic as f64 - 70.0) / 50.0;

        Self {
            age: clamp01((input.age as f64 - 25.0) / 55.0),
            blood_pressure: clamp01((systolic + diastolic) / 2.0),
            cholesterol: clamp01((input.cholesterol as f64 - 160.0) / 120.0),
            blood_sugar: clamp01((input.blood_sugar as f64 - 90.0) / 170.0),
            bmi: clamp01((input.bmi - 22.0) / 18.0),
            smoking: if input.smoking.is_yes() { 1.0 } else { 0.0 },
            family_history: if input.family_history.is_yes() { 1.0 } else { 0.0 },
            exercise: match input.exercise_level {
                ExerciseLevel::Low => 1.0,
                ExerciseLevel::Moderate => 0.5,
                ExerciseLevel::High => 0.1,
            },
            diet: match input.diet_quality {
                DietQuality::Poor => 1.0,
                DietQuality::Balanced => 0.5,
                DietQuality::Excellent => 0.1,
            },
        }
    }

    /// Weighted blend feeding the overall score
    pub fn base(&self) -> f64 {
        W_AGE * self.age
            + W_BP * self.blood_pressure
            + W_CHOL * self.cholesterol
            + W_SUGAR * self.blood_sugar
            + W_BMI * self.bmi
            + W_SMOKE * self.smoking
            + W_FAMILY * self.family_history
            + W_EXERCISE * self.exercise
            + W_DIET * self.diet
    }

    pub fn overall(&self) -> u8 {
        to_percent(sigmoid((self.base() - OVERALL_OFFSET) * OVERALL_STEEPNESS))
    }

    pub fn heart_disease(&self) -> u8 {
        let z = 1.2 * self.age + 1.4 * self.blood_pressure + 1.1 * self.cholesterol
            + 0.6 * self.smoking
            - 1.3;
        to_percent(sigmoid(z * 2.0))
    }

    pub fn diabetes(&self) -> u8 {
        let z = 1.2 * self.blood_sugar + 0.9 * self.bmi + 0.4 * self.family_history
            + 0.3 * self.diet
            - 1.2;
        to_percent(sigmoid(z * 2.2))
    }

    pub fn hypertension(&self) -> u8 {
        let z = 1.8 * self.blood_pressure + 0.6 * self.age + 0.4 * self.bmi
            + 0.2 * self.smoking
            - 1.05;
        to_percent(sigmoid(z * 2.1))
    }
}

/// Score `input`, stamping the result with the current time
pub fn compute_risk(input: &RiskInput) -> RiskOutput {
    compute_risk_at(input, Utc::now())
}

/// Score `input` with an explicit generation timestamp
pub fn compute_risk_at(input: &RiskInput, generated_at: DateTime<Utc>) -> RiskOutput {
    let factors = RiskFactors::from_input(input);
    let overall_risk = factors.overall();

    RiskOutput {
        overall_risk,
        label: RiskLabel::from_score(overall_risk),
        heart_disease: factors.heart_disease(),
        diabetes: factors.diabetes(),
        hypertension: factors.hypertension(),
        generated_at,
    }
}

/// Pick the highest sub-score; ties go to the earlier of
/// heart disease, diabetes, hypertension.
pub fn dominant_condition(heart_disease: u8, diabetes: u8, hypertension: u8) -> Condition {
    let mut best = (Condition::HeartDisease, heart_disease);
    for candidate in [
        (Condition::Diabetes, diabetes),
        (Condition::Hypertension, hypertension),
    ] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    best.0
}

#[inline]
fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[inline]
fn to_percent(p: f64) -> u8 {
    (clamp01(p) * 100.0).round_ties_even() as u8
}
