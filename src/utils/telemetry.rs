//! Telemetry Module for MedPredict
//!
//! Collects anonymous statistics about scored assessments for
//! operational monitoring and the provider analytics view.
//!
//! Privacy-first: no names, emails or patient codes are stored

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::core::risk_score::RiskOutput;
use crate::models::types::{Condition, RiskLabel};
use crate::utils::constants::{DEFAULT_TELEMETRY_BUFFER, DEFAULT_TELEMETRY_DIR};

/// Single assessment event (anonymized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentEvent {
    /// Unix timestamp
    pub timestamp: u64,
    pub overall_risk: u8,
    pub label: RiskLabel,
    pub condition: Condition,
    /// Scoring latency in microseconds
    pub latency_us: u64,
    /// Which operation scored it (`score`, `assess`)
    pub source: String,
}

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    pub total_assessments: u64,
    /// Indexed like `RiskLabel::ALL`
    pub by_label: [u64; 4],
    /// Indexed like `Condition::ALL`
    pub by_condition: [u64; 3],
    pub avg_latency_us: f64,
    pub period_start: u64,
    pub period_end: u64,
}

impl TelemetryStats {
    /// Share of assessments labelled high or critical, in percent
    pub fn elevated_share(&self) -> f64 {
        if self.total_assessments == 0 {
            return 0.0;
        }
        let elevated = self.by_label[2] + self.by_label[3];
        elevated as f64 * 100.0 / self.total_assessments as f64
    }
}

/// Main telemetry collector
pub struct AssessmentTelemetry {
    events: RwLock<Vec<AssessmentEvent>>,
    total_assessments: AtomicU64,
    by_label: [AtomicU64; 4],
    by_condition: [AtomicU64; 3],
    total_latency_us: AtomicU64,
    session_start: u64,
    export_dir: PathBuf,
    /// Max events in memory before flush
    max_buffer_size: usize,
}

impl AssessmentTelemetry {
    pub fn new() -> Self {
        Self::with_config(PathBuf::from(DEFAULT_TELEMETRY_DIR), DEFAULT_TELEMETRY_BUFFER)
    }

    /// The export directory is created lazily on first write
    pub fn with_config(export_dir: PathBuf, max_buffer_size: usize) -> Self {
        Self {
            events: RwLock::new(Vec::with_capacity(max_buffer_size.min(1024))),
            total_assessments: AtomicU64::new(0),
            by_label: Default::default(),
            by_condition: Default::default(),
            total_latency_us: AtomicU64::new(0),
            session_start: current_timestamp(),
            export_dir,
            max_buffer_size: max_buffer_size.max(1),
        }
    }

    /// Record one scored assessment
    pub fn record_assessment(&self, result: &RiskOutput, latency_us: u64, source: &str) {
        let label = result.label;
        let condition = result.dominant_condition();

        self.total_assessments.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.by_label[label.index()].fetch_add(1, Ordering::Relaxed);
        self.by_condition[condition.index()].fetch_add(1, Ordering::Relaxed);

        let event = AssessmentEvent {
            timestamp: current_timestamp(),
            overall_risk: result.overall_risk,
            label,
            condition,
            latency_us,
            source: source.to_string(),
        };

        let to_flush = match self.events.write() {
            Ok(mut events) => {
                events.push(event);
                if events.len() >= self.max_buffer_size {
                    Some(std::mem::take(&mut *events))
                } else {
                    None
                }
            }
            Err(_) => None,
        };

        // Lock released before I/O. Inside a runtime the write goes to the
        // blocking pool so request handlers never wait on the disk.
        if let Some(events) = to_flush {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let dir = self.export_dir.clone();
                    handle.spawn_blocking(move || flush_or_warn(&dir, &events));
                }
                Err(_) => flush_or_warn(&self.export_dir, &events),
            }
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total = self.total_assessments.load(Ordering::Relaxed);
        let latency = self.total_latency_us.load(Ordering::Relaxed);

        TelemetryStats {
            total_assessments: total,
            by_label: self.label_counts(),
            by_condition: std::array::from_fn(|i| self.by_condition[i].load(Ordering::Relaxed)),
            avg_latency_us: if total > 0 {
                latency as f64 / total as f64
            } else {
                0.0
            },
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    pub fn label_counts(&self) -> [u64; 4] {
        std::array::from_fn(|i| self.by_label[i].load(Ordering::Relaxed))
    }

    /// Events currently held in memory
    pub fn buffered(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Flush buffered events and write current stats to a JSON file
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        let pending = self
            .events
            .write()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default();
        write_events(&self.export_dir, &pending)?;

        fs::create_dir_all(&self.export_dir)?;
        let stats = self.get_stats();
        let path = self
            .export_dir
            .join(format!("stats_{}.json", current_timestamp()));

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }

}

fn flush_or_warn(dir: &Path, events: &[AssessmentEvent]) {
    if let Err(e) = write_events(dir, events) {
        warn!(error = %e, dropped = events.len(), "Telemetry flush failed");
    }
}

/// Append events to this second's `events_<ts>.jsonl`
fn write_events(dir: &Path, events: &[AssessmentEvent]) -> Result<(), std::io::Error> {
    if events.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(format!("events_{}.jsonl", current_timestamp()));
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

    for event in events {
        writeln!(file, "{}", serde_json::to_string(event)?)?;
    }

    debug!(count = events.len(), path = %path.display(), "Telemetry events flushed");
    Ok(())
}

impl Default for AssessmentTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk_score::compute_risk;
    use crate::models::types::{DietQuality, ExerciseLevel, RiskInput, YesNo};

    fn healthy() -> RiskInput {
        RiskInput {
            age: 25,
            systolic: 110,
            diastolic: 70,
            cholesterol: 160,
            blood_sugar: 90,
            bmi: 22.0,
            smoking: YesNo::No,
            family_history: YesNo::No,
            exercise_level: ExerciseLevel::High,
            diet_quality: DietQuality::Excellent,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("medpredict_{}_{}", name, uuid::Uuid::new_v4().simple()))
    }

    #[test]
    fn test_collector_counts() {
        let telemetry = AssessmentTelemetry::with_config(temp_dir("counts"), 100);
        let result = compute_risk(&healthy());

        telemetry.record_assessment(&result, 10, "score");
        telemetry.record_assessment(&result, 30, "assess");

        let stats = telemetry.get_stats();
        assert_eq!(stats.total_assessments, 2);
        assert_eq!(stats.by_label, [2, 0, 0, 0]);
        // Healthy profile: hypertension sub-score is the largest
        assert_eq!(stats.by_condition, [0, 0, 2]);
        assert_eq!(stats.avg_latency_us, 20.0);
        assert_eq!(stats.elevated_share(), 0.0);
        assert_eq!(telemetry.buffered(), 2);
    }

    fn event_files(dir: &Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn test_buffer_flushes_inline_without_runtime() {
        let dir = temp_dir("flush");
        let telemetry = AssessmentTelemetry::with_config(dir.clone(), 2);
        let result = compute_risk(&healthy());

        telemetry.record_assessment(&result, 5, "score");
        telemetry.record_assessment(&result, 5, "score");

        assert_eq!(telemetry.buffered(), 0);
        assert_eq!(event_files(&dir), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_buffer_flushes_on_blocking_pool() {
        let dir = temp_dir("flush_async");
        let telemetry = AssessmentTelemetry::with_config(dir.clone(), 2);
        let result = compute_risk(&healthy());

        telemetry.record_assessment(&result, 5, "assess");
        telemetry.record_assessment(&result, 5, "assess");
        assert_eq!(telemetry.buffered(), 0);

        for _ in 0..100 {
            if event_files(&dir) == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(event_files(&dir), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_export_stats_json() {
        let dir = temp_dir("export");
        let telemetry = AssessmentTelemetry::with_config(dir.clone(), 100);
        telemetry.record_assessment(&compute_risk(&healthy()), 5, "score");

        let path = telemetry.export_stats_json().unwrap();
        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("total_assessments"));
        assert_eq!(telemetry.buffered(), 0);
        let _ = fs::remove_dir_all(&dir);
    }
}
