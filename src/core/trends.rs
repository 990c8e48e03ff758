//! Patient trend series
//!
//! Builds chart series from the patient's logged health entries. Only
//! entries logged through the API carry measurements; seeded or
//! free-form entries are skipped.

use serde::{Deserialize, Serialize};

use crate::models::types::HealthEntry;
use crate::utils::constants::TREND_POINTS;

/// Measurements read back from a logged entry's body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reading {
    systolic: i32,
    diastolic: i32,
    heart_rate: i32,
    weight_kg: f64,
    sleep_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeSummary {
    pub avg: i32,
    pub lowest: i32,
    pub highest: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HeartRateTrend {
    pub labels: Vec<String>,
    pub values: Vec<i32>,
    pub summary: Option<RangeSummary>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BloodPressureTrend {
    pub labels: Vec<String>,
    pub systolic: Vec<i32>,
    pub diastolic: Vec<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCards {
    /// Latest minus earliest plotted weight
    pub weight_progress_kg: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientTrends {
    pub heart_rate: HeartRateTrend,
    pub blood_pressure: BloodPressureTrend,
    pub weight: Series,
    pub sleep: Series,
    pub summary_cards: SummaryCards,
}

/// Build trends from entries stored newest first. Series run oldest to
/// newest and hold at most `TREND_POINTS` readings.
pub fn build_trends(entries: &[HealthEntry]) -> PatientTrends {
    let mut readings: Vec<(&str, Reading)> = entries
        .iter()
        .filter_map(|entry| {
            let raw = entry.raw.clone()?;
            let reading = serde_json::from_value::<Reading>(raw).ok()?;
            Some((entry.recorded_at.as_str(), reading))
        })
        .take(TREND_POINTS)
        .collect();
    readings.reverse();

    let labels: Vec<String> = readings.iter().map(|(at, _)| at.to_string()).collect();
    let heart: Vec<i32> = readings.iter().map(|(_, r)| r.heart_rate).collect();
    let weight: Vec<f64> = readings.iter().map(|(_, r)| r.weight_kg).collect();
    let sleep: Vec<f64> = readings.iter().map(|(_, r)| r.sleep_hours).collect();

    let summary_cards = SummaryCards {
        weight_progress_kg: match (weight.first(), weight.last()) {
            (Some(first), Some(last)) => Some(round1(last - first)),
            _ => None,
        },
        avg_sleep_hours: mean(&sleep).map(round1),
    };

    PatientTrends {
        heart_rate: HeartRateTrend {
            labels: labels.clone(),
            summary: range_summary(&heart),
            values: heart,
        },
        blood_pressure: BloodPressureTrend {
            labels: labels.clone(),
            systolic: readings.iter().map(|(_, r)| r.systolic).collect(),
            diastolic: readings.iter().map(|(_, r)| r.diastolic).collect(),
        },
        weight: Series {
            labels: labels.clone(),
            values: weight,
        },
        sleep: Series {
            labels,
            values: sleep,
        },
        summary_cards,
    }
}

fn range_summary(values: &[i32]) -> Option<RangeSummary> {
    let lowest = *values.iter().min()?;
    let highest = *values.iter().max()?;
    let avg = mean(&values.iter().map(|v| f64::from(*v)).collect::<Vec<_>>())?;
    Some(RangeSummary {
        avg: avg.round_ties_even() as i32,
        lowest,
        highest,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
