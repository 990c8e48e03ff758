//! In-Memory Store
//!
//! Thread-safe storage for accounts, bearer tokens, patient profiles,
//! doctor/patient links, assessment history and health entries.
//! Backed by DashMap so concurrent requests never take a global lock.
//!
//! Multi-step writes that must stay consistent (profile update plus
//! history append) run while holding the profile's shard guard.

pub mod seed;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::risk_score::RiskOutput;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{
    AssessmentRecord, Gender, HealthEntry, NewUser, PatientProfile, PatientSummary, Role, User,
};
use crate::utils::clock;
use crate::utils::constants::{
    DOCTOR_CODE_ALPHABET, DOCTOR_CODE_ATTEMPTS, DOCTOR_CODE_LEN, DOCTOR_CODE_PREFIX,
    HEALTH_ENTRY_PREFIX, TOKEN_LEN, TOKEN_PREFIX,
};

#[derive(Default)]
pub struct Store {
    /// user id -> account
    users: DashMap<String, User>,
    /// lowercase email -> user id
    emails: DashMap<String, String>,
    /// bearer token -> user id
    tokens: DashMap<String, String>,
    /// doctor code -> provider user id
    doctor_codes: DashMap<String, String>,
    /// patient user id -> profile
    profiles: DashMap<String, PatientProfile>,
    /// patient code -> patient user id
    patient_codes: DashMap<String, String>,
    /// patient user id -> provider user id
    assignments: DashMap<String, String>,
    /// patient user id -> assessment history, oldest first
    assessments: DashMap<String, Vec<AssessmentRecord>>,
    /// patient user id -> health entries, newest first
    health_entries: DashMap<String, Vec<HealthEntry>>,
    /// last allocated patient sequence number
    patient_seq: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================
    // Users & tokens
    // ============================================

    /// Create an account; emails are unique (case-insensitive)
    pub fn insert_user(&self, new_user: NewUser) -> AppResult<User> {
        let email = normalize_email(&new_user.email);
        let id = Uuid::new_v4().simple().to_string();

        match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::new(
                    ErrorCode::StoreDuplicateKey,
                    "Email already registered",
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        let user = User {
            id: id.clone(),
            role: new_user.role,
            full_name: new_user.full_name.trim().to_string(),
            email,
            phone: new_user.phone,
            date_of_birth: new_user.date_of_birth,
            specialization: new_user.specialization,
            license_number: new_user.license_number,
            doctor_code: None,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    pub fn user_by_id(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let id = self.emails.get(&normalize_email(email))?.clone();
        self.user_by_id(&id)
    }

    /// Issue a fresh random bearer token for `user_id`
    pub fn issue_token(&self, user_id: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        let token = format!("{}{}", TOKEN_PREFIX, suffix);
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    /// Register a caller-chosen token (seed data, fixtures)
    pub fn register_token(&self, token: &str, user_id: &str) -> AppResult<()> {
        if self.users.get(user_id).is_none() {
            return Err(AppError::not_found("User not found"));
        }
        self.tokens.insert(token.to_string(), user_id.to_string());
        Ok(())
    }

    pub fn user_by_token(&self, token: &str) -> Option<User> {
        let id = self.tokens.get(token)?.clone();
        self.user_by_id(&id)
    }

    // ============================================
    // Doctor codes
    // ============================================

    pub fn doctor_by_code(&self, code: &str) -> Option<User> {
        let code = code.trim().to_ascii_uppercase();
        let id = self.doctor_codes.get(&code)?.clone();
        self.user_by_id(&id).filter(|u| u.role == Role::Provider)
    }

    /// Return the provider's doctor code, generating one on first use
    pub fn ensure_doctor_code(&self, provider_id: &str) -> AppResult<String> {
        if let Some(code) = self.existing_doctor_code(provider_id)? {
            return Ok(code);
        }

        for _ in 0..DOCTOR_CODE_ATTEMPTS {
            match self.claim_doctor_code(provider_id, &generate_doctor_code()) {
                Ok(code) => return Ok(code),
                Err(e) if e.code == ErrorCode::StoreDuplicateKey => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::new(
            ErrorCode::StoreCodeExhausted,
            "Could not generate doctor code",
        ))
    }

    /// Bind `code` to the provider unless they already have one.
    /// Returns whichever code the provider ends up with.
    pub fn claim_doctor_code(&self, provider_id: &str, code: &str) -> AppResult<String> {
        let code = code.trim().to_ascii_uppercase();
        let mut user = self
            .users
            .get_mut(provider_id)
            .ok_or_else(|| AppError::not_found("Provider not found"))?;
        if user.role != Role::Provider {
            return Err(AppError::bad_request("Only providers have doctor codes"));
        }
        if let Some(existing) = user.doctor_code.clone() {
            return Ok(existing);
        }

        match self.doctor_codes.entry(code.clone()) {
            Entry::Occupied(_) => Err(AppError::new(
                ErrorCode::StoreDuplicateKey,
                "Doctor code already taken",
            )),
            Entry::Vacant(slot) => {
                slot.insert(provider_id.to_string());
                user.doctor_code = Some(code.clone());
                info!(provider_id, doctor_code = %code, "Doctor code assigned");
                Ok(code)
            }
        }
    }

    fn existing_doctor_code(&self, provider_id: &str) -> AppResult<Option<String>> {
        let user = self
            .users
            .get(provider_id)
            .ok_or_else(|| AppError::not_found("Provider not found"))?;
        Ok(user.doctor_code.clone())
    }

    // ============================================
    // Patient profiles
    // ============================================

    /// Return the patient's profile, creating it with the next patient code
    pub fn ensure_patient_profile(&self, user_id: &str, gender: Option<Gender>) -> PatientProfile {
        self.profiles
            .entry(user_id.to_string())
            .or_insert_with(|| {
                let seq = self.patient_seq.fetch_add(1, Ordering::SeqCst) + 1;
                let profile = PatientProfile::new(user_id.to_string(), seq, gender.unwrap_or_default());
                self.patient_codes
                    .insert(profile.patient_code.clone(), user_id.to_string());
                debug!(user_id, patient_code = %profile.patient_code, "Patient profile created");
                profile
            })
            .clone()
    }

    pub fn profile(&self, user_id: &str) -> Option<PatientProfile> {
        self.profiles.get(user_id).map(|p| p.clone())
    }

    // ============================================
    // Doctor / patient links
    // ============================================

    /// Link a patient to a provider; a patient has at most one provider
    pub fn assign_patient(&self, patient_id: &str, provider_id: &str) -> AppResult<()> {
        match self.assignments.entry(patient_id.to_string()) {
            Entry::Occupied(_) => Err(AppError::conflict("Patient already assigned to a doctor")),
            Entry::Vacant(slot) => {
                slot.insert(provider_id.to_string());
                info!(patient_id, provider_id, "Patient assigned");
                Ok(())
            }
        }
    }

    pub fn doctor_for_patient(&self, patient_id: &str) -> Option<String> {
        self.assignments.get(patient_id).map(|d| d.clone())
    }

    /// Provider's patients ordered by patient sequence
    pub fn assigned_patients(&self, provider_id: &str, today: NaiveDate) -> Vec<PatientSummary> {
        let patient_ids: Vec<String> = self
            .assignments
            .iter()
            .filter(|link| link.value() == provider_id)
            .map(|link| link.key().clone())
            .collect();

        let mut rows: Vec<(u64, PatientSummary)> = patient_ids
            .iter()
            .map(|pid| {
                let user = self.user_by_id(pid);
                let profile = self.profile(pid);
                let seq = profile.as_ref().map(|p| p.seq).unwrap_or(0);
                (seq, summarize(pid, user.as_ref(), profile.as_ref(), today))
            })
            .collect();

        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Resolve a patient code to a patient assigned to `provider_id`
    pub fn find_patient_for_doctor(&self, provider_id: &str, patient_code: &str) -> Option<String> {
        let patient_id = self.patient_codes.get(patient_code.trim())?.clone();
        let assigned = self.assignments.get(&patient_id)?;
        (assigned.value() == provider_id).then_some(patient_id)
    }

    // ============================================
    // Assessments
    // ============================================

    /// Apply a computed risk result to the patient's profile and append it
    /// to their history as one step.
    pub fn apply_assessment(
        &self,
        patient_id: &str,
        provider_id: &str,
        result: &RiskOutput,
        assessed_at: DateTime<Utc>,
    ) -> AppResult<AssessmentRecord> {
        let mut profile = self
            .profiles
            .get_mut(patient_id)
            .ok_or_else(|| AppError::not_found("Patient profile not found"))?;

        let condition = result.dominant_condition();
        profile.risk_score = result.overall_risk;
        profile.status = result.label;
        profile.condition = Some(condition);
        profile.last_visit = Some(assessed_at.date_naive());
        profile.last_assessed_at = Some(assessed_at);
        profile.last_assessment = Some(result.clone());

        let record = AssessmentRecord {
            patient_user_id: patient_id.to_string(),
            patient_code: profile.patient_code.clone(),
            provider_user_id: provider_id.to_string(),
            created_at: assessed_at,
            result: result.clone(),
            condition,
            status: result.label,
            overall_risk: result.overall_risk,
        };
        self.assessments
            .entry(patient_id.to_string())
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    /// Patient's assessment history, oldest first
    pub fn assessments_for(&self, patient_id: &str) -> Vec<AssessmentRecord> {
        self.assessments
            .get(patient_id)
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Assessments recorded by `provider_id`, counted per label
    /// (indexed like `RiskLabel::ALL`)
    pub fn assessment_label_counts(&self, provider_id: &str) -> [u64; 4] {
        let mut counts = [0u64; 4];
        for history in self.assessments.iter() {
            for record in history.value().iter().filter(|r| r.provider_user_id == provider_id) {
                counts[record.status.index()] += 1;
            }
        }
        counts
    }

    // ============================================
    // Health entries
    // ============================================

    pub fn next_health_entry_id(&self) -> String {
        let n: u64 = rand::thread_rng().gen();
        format!("{}{:016X}", HEALTH_ENTRY_PREFIX, n)
    }

    /// Store an entry, newest first
    pub fn add_health_entry(&self, entry: HealthEntry) {
        self.health_entries
            .entry(entry.patient_user_id.clone())
            .or_default()
            .insert(0, entry);
    }

    pub fn health_entries(&self, patient_id: &str) -> Vec<HealthEntry> {
        self.health_entries
            .get(patient_id)
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_doctor_code() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..DOCTOR_CODE_LEN)
        .map(|_| DOCTOR_CODE_ALPHABET[rng.gen_range(0..DOCTOR_CODE_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", DOCTOR_CODE_PREFIX, body)
}

fn summarize(
    patient_id: &str,
    user: Option<&User>,
    profile: Option<&PatientProfile>,
    today: NaiveDate,
) -> PatientSummary {
    PatientSummary {
        id: profile
            .map(|p| p.patient_code.clone())
            .unwrap_or_else(|| patient_id.to_string()),
        name: user.map(|u| u.full_name.clone()).unwrap_or_default(),
        age: user
            .and_then(|u| u.date_of_birth)
            .and_then(|dob| clock::age_on(dob, today)),
        gender: profile.map(|p| p.gender).unwrap_or_default(),
        last_visit: profile
            .and_then(|p| p.last_visit)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        risk_score: profile.map(|p| p.risk_score).unwrap_or(0),
        status: profile.map(|p| p.status).unwrap_or(crate::models::types::RiskLabel::Low),
        condition: profile
            .map(|p| p.condition_str())
            .unwrap_or(crate::models::types::NO_CONDITION)
            .to_string(),
        last_assessed_at: profile
            .and_then(|p| p.last_assessed_at)
            .map(clock::format_iso)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk_score::compute_risk_at;
    use crate::models::types::{DietQuality, ExerciseLevel, RiskInput, RiskLabel, YesNo};

    fn new_user(role: Role, email: &str) -> NewUser {
        NewUser {
            role,
            full_name: "Test User".to_string(),
            email: email.to_string(),
            phone: None,
            date_of_birth: None,
            specialization: None,
            license_number: None,
            password_hash: None,
        }
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = Store::new();
        store.insert_user(new_user(Role::Patient, "a@example.com")).unwrap();
        let err = store
            .insert_user(new_user(Role::Patient, "A@Example.com "))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreDuplicateKey);
    }

    #[test]
    fn test_token_lookup() {
        let store = Store::new();
        let user = store.insert_user(new_user(Role::Provider, "dr@example.com")).unwrap();
        let token = store.issue_token(&user.id);
        assert!(token.starts_with("mp_"));
        assert_eq!(store.user_by_token(&token).unwrap().id, user.id);
        assert!(store.user_by_token("mp_unknown").is_none());
    }

    #[test]
    fn test_doctor_code_is_stable() {
        let store = Store::new();
        let dr = store.insert_user(new_user(Role::Provider, "dr@example.com")).unwrap();
        let first = store.ensure_doctor_code(&dr.id).unwrap();
        let second = store.ensure_doctor_code(&dr.id).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("DR-"));
        assert_eq!(first.len(), 3 + 8);
        assert_eq!(store.doctor_by_code(&first.to_lowercase()).unwrap().id, dr.id);
    }

    #[test]
    fn test_patient_codes_are_sequential() {
        let store = Store::new();
        let a = store.insert_user(new_user(Role::Patient, "a@example.com")).unwrap();
        let b = store.insert_user(new_user(Role::Patient, "b@example.com")).unwrap();
        assert_eq!(store.ensure_patient_profile(&a.id, None).patient_code, "P001");
        assert_eq!(store.ensure_patient_profile(&b.id, Some(Gender::Female)).patient_code, "P002");
        // Idempotent
        assert_eq!(store.ensure_patient_profile(&a.id, None).patient_code, "P001");
    }

    #[test]
    fn test_assignment_is_exclusive() {
        let store = Store::new();
        let p = store.insert_user(new_user(Role::Patient, "p@example.com")).unwrap();
        store.assign_patient(&p.id, "dr-1").unwrap();
        let err = store.assign_patient(&p.id, "dr-2").unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiConflict);
        assert_eq!(store.doctor_for_patient(&p.id).as_deref(), Some("dr-1"));
    }

    #[test]
    fn test_find_patient_requires_assignment_to_caller() {
        let store = Store::new();
        let p = store.insert_user(new_user(Role::Patient, "p@example.com")).unwrap();
        let code = store.ensure_patient_profile(&p.id, None).patient_code;
        store.assign_patient(&p.id, "dr-1").unwrap();
        assert_eq!(store.find_patient_for_doctor("dr-1", &code), Some(p.id.clone()));
        assert_eq!(store.find_patient_for_doctor("dr-2", &code), None);
        assert_eq!(store.find_patient_for_doctor("dr-1", "P999"), None);
    }

    #[test]
    fn test_apply_assessment_updates_profile_and_history() {
        let store = Store::new();
        let p = store.insert_user(new_user(Role::Patient, "p@example.com")).unwrap();
        store.ensure_patient_profile(&p.id, None);

        let input = RiskInput {
            age: 70,
            systolic: 180,
            diastolic: 110,
            cholesterol: 280,
            blood_sugar: 250,
            bmi: 38.0,
            smoking: YesNo::Yes,
            family_history: YesNo::Yes,
            exercise_level: ExerciseLevel::Low,
            diet_quality: DietQuality::Poor,
        };
        let now = Utc::now();
        let result = compute_risk_at(&input, now);
        let record = store.apply_assessment(&p.id, "dr-1", &result, now).unwrap();

        let profile = store.profile(&p.id).unwrap();
        assert_eq!(profile.risk_score, 100);
        assert_eq!(profile.status, RiskLabel::Critical);
        assert_eq!(profile.condition_str(), "Heart Disease");
        assert_eq!(record.patient_code, "P001");
        assert_eq!(store.assessments_for(&p.id).len(), 1);
    }

    #[test]
    fn test_apply_assessment_without_profile_fails() {
        let store = Store::new();
        let input = RiskInput {
            age: 30,
            systolic: 120,
            diastolic: 80,
            cholesterol: 180,
            blood_sugar: 95,
            bmi: 23.0,
            smoking: YesNo::No,
            family_history: YesNo::No,
            exercise_level: ExerciseLevel::High,
            diet_quality: DietQuality::Balanced,
        };
        let now = Utc::now();
        let result = compute_risk_at(&input, now);
        let err = store.apply_assessment("missing", "dr-1", &result, now).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiNotFound);
    }

    #[test]
    fn test_label_counts_are_per_provider() {
        let store = Store::new();
        let now = Utc::now();
        let critical = compute_risk_at(
            &RiskInput {
                age: 70,
                systolic: 180,
                diastolic: 110,
                cholesterol: 280,
                blood_sugar: 250,
                bmi: 38.0,
                smoking: YesNo::Yes,
                family_history: YesNo::Yes,
                exercise_level: ExerciseLevel::Low,
                diet_quality: DietQuality::Poor,
            },
            now,
        );
        let low = compute_risk_at(
            &RiskInput {
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
            },
            now,
        );

        let a = store.insert_user(new_user(Role::Patient, "a@example.com")).unwrap();
        let b = store.insert_user(new_user(Role::Patient, "b@example.com")).unwrap();
        store.ensure_patient_profile(&a.id, None);
        store.ensure_patient_profile(&b.id, None);

        store.apply_assessment(&a.id, "dr-1", &critical, now).unwrap();
        store.apply_assessment(&a.id, "dr-1", &low, now).unwrap();
        store.apply_assessment(&b.id, "dr-2", &critical, now).unwrap();

        assert_eq!(store.assessment_label_counts("dr-1"), [1, 0, 0, 1]);
        assert_eq!(store.assessment_label_counts("dr-2"), [0, 0, 0, 1]);
        assert_eq!(store.assessment_label_counts("dr-3"), [0, 0, 0, 0]);
    }

    #[test]
    fn test_password_hash_is_kept() {
        let store = Store::new();
        let mut user = new_user(Role::Patient, "p@example.com");
        user.password_hash = Some("pbkdf2_sha256$1000$c2FsdA==$aGFzaA==".to_string());
        let created = store.insert_user(user).unwrap();
        assert!(store.user_by_id(&created.id).unwrap().password_hash.is_some());
    }

    #[test]
    fn test_health_entries_newest_first() {
        let store = Store::new();
        for (i, kind) in ["Weight", "Sleep"].iter().enumerate() {
            store.add_health_entry(HealthEntry {
                id: format!("E{}", i),
                patient_user_id: "p1".to_string(),
                kind: kind.to_string(),
                value: String::new(),
                tag: "logged".to_string(),
                recorded_at: String::new(),
                raw: None,
            });
        }
        let entries = store.health_entries("p1");
        assert_eq!(entries[0].kind, "Sleep");
        assert_eq!(entries[1].kind, "Weight");
        assert!(store.health_entries("p2").is_empty());
    }

    #[test]
    fn test_health_entry_id_format() {
        let store = Store::new();
        let id = store.next_health_entry_id();
        assert_eq!(id.len(), 17);
        assert!(id.starts_with('E'));
        assert!(id[1..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
