//! Demo seed data
//!
//! Loads one provider and a set of assigned patients with fixed bearer
//! tokens for local demos. Demo accounts have no password and cannot log
//! in; only their tokens work. The server loads them only when
//! `MEDPREDICT_SEED_DEMO` is set.
//! Patients with a baseline measurement are scored through the regular
//! assessment path.

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::Store;
use crate::core::risk_score::compute_risk_at;
use crate::models::errors::AppResult;
use crate::models::types::{
    DietQuality, ExerciseLevel, Gender, HealthEntry, NewUser, RiskInput, Role, YesNo,
};
use crate::utils::clock;

pub const DEMO_PROVIDER_TOKEN: &str = "mp_demo_provider";
pub const DEMO_PROVIDER_EMAIL: &str = "sarah.smith@medpredict.local";
pub const DEMO_DOCTOR_CODE: &str = "DR-DEMO2026";

struct DemoPatient {
    name: &'static str,
    email: &'static str,
    token: &'static str,
    age: u32,
    gender: Gender,
    baseline: Option<RiskInput>,
}

#[allow(clippy::too_many_arguments)]
fn input(
    age: i32,
    bp: (i32, i32),
    cholesterol: i32,
    blood_sugar: i32,
    bmi: f64,
    smoking: YesNo,
    family_history: YesNo,
    exercise_level: ExerciseLevel,
    diet_quality: DietQuality,
) -> RiskInput {
    RiskInput {
        age,
        systolic: bp.0,
        diastolic: bp.1,
        cholesterol,
        blood_sugar,
        bmi,
        smoking,
        family_history,
        exercise_level,
        diet_quality,
    }
}

fn demo_patients() -> Vec<DemoPatient> {
    use DietQuality::*;
    use ExerciseLevel::{Low as Sedentary, Moderate};
    use YesNo::{No, Yes};

    vec![
        DemoPatient {
            name: "John Doe",
            email: "john.doe@medpredict.local",
            token: "mp_demo_p001",
            age: 58,
            gender: Gender::Male,
            baseline: Some(input(58, (150, 95), 240, 180, 31.0, Yes, No, Sedentary, Balanced)),
        },
        DemoPatient {
            name: "Jane Smith",
            email: "jane.smith@medpredict.local",
            token: "mp_demo_p002",
            age: 62,
            gender: Gender::Female,
            baseline: Some(input(62, (150, 90), 230, 140, 30.0, No, Yes, Sedentary, Balanced)),
        },
        DemoPatient {
            name: "Mike Johnson",
            email: "mike.johnson@medpredict.local",
            token: "mp_demo_p003",
            age: 45,
            gender: Gender::Male,
            baseline: Some(input(45, (130, 85), 200, 110, 27.5, No, Yes, Moderate, Balanced)),
        },
        DemoPatient {
            name: "Emma Wilson",
            email: "emma.wilson@medpredict.local",
            token: "mp_demo_p004",
            age: 35,
            gender: Gender::Female,
            baseline: Some(input(35, (120, 78), 180, 95, 24.0, No, No, Moderate, Balanced)),
        },
        DemoPatient {
            name: "Komeza Manase",
            email: "komeza.manase@medpredict.local",
            token: "mp_demo_p005",
            age: 34,
            gender: Gender::Male,
            baseline: None,
        },
    ]
}

/// What the seed loader created
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub provider_id: String,
    pub doctor_code: String,
    pub patient_ids: Vec<String>,
}

/// Populate `store` with the demo provider and patients
pub fn load_demo(store: &Store) -> AppResult<SeedSummary> {
    let today = Utc::now().date_naive();

    let provider = store.insert_user(NewUser {
        role: Role::Provider,
        full_name: "Dr. Sarah Smith".to_string(),
        email: DEMO_PROVIDER_EMAIL.to_string(),
        phone: None,
        date_of_birth: None,
        specialization: Some("Cardiology".to_string()),
        license_number: Some("LIC-100234".to_string()),
        password_hash: None,
    })?;
    let doctor_code = store.claim_doctor_code(&provider.id, DEMO_DOCTOR_CODE)?;
    store.register_token(DEMO_PROVIDER_TOKEN, &provider.id)?;

    let mut patient_ids = Vec::new();
    for demo in demo_patients() {
        let user = store.insert_user(NewUser {
            role: Role::Patient,
            full_name: demo.name.to_string(),
            email: demo.email.to_string(),
            phone: None,
            date_of_birth: Some(clock::birth_date_for_age(demo.age, today)),
            specialization: None,
            license_number: None,
            password_hash: None,
        })?;
        store.register_token(demo.token, &user.id)?;
        store.ensure_patient_profile(&user.id, Some(demo.gender));
        store.assign_patient(&user.id, &provider.id)?;

        if let Some(baseline) = demo.baseline {
            let now = Utc::now();
            let result = compute_risk_at(&baseline, now);
            store.apply_assessment(&user.id, &provider.id, &result, now)?;
        }

        patient_ids.push(user.id);
    }

    if let Some(first) = patient_ids.first() {
        seed_health_entries(store, first);
    }

    info!(
        provider = %provider.full_name,
        doctor_code = %doctor_code,
        patients = patient_ids.len(),
        "Demo data loaded"
    );

    Ok(SeedSummary {
        provider_id: provider.id,
        doctor_code,
        patient_ids,
    })
}

fn seed_health_entries(store: &Store, patient_id: &str) {
    let entries = [
        ("Sleep", "7.9 hours", "good", date(2026, 2, 7), "11:00 PM"),
        ("Weight", "78.2 kg", "progress", date(2026, 2, 8), "07:15 AM"),
        ("Blood Pressure", "120/80 mmHg", "normal", date(2026, 2, 8), "08:30 AM"),
    ];

    // Oldest first; the store keeps newest on top
    for (kind, value, tag, day, time) in entries {
        store.add_health_entry(HealthEntry {
            id: store.next_health_entry_id(),
            patient_user_id: patient_id.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
            tag: tag.to_string(),
            recorded_at: format!("{} {}", day, time),
            raw: None,
        });
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
