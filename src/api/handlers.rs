//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::middleware::{RateLimitConfig, RateLimiter};
use super::types::*;
use crate::core::accounts;
use crate::core::assessment::{self, ProviderAnalytics, ProviderOverview};
use crate::core::assistant;
use crate::core::risk_score::{compute_risk, RiskOutput};
use crate::core::trends::{self, PatientTrends};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    HealthEntry, LoginRequest, PublicUser, RiskInput, Role, SignupRequest, User,
};
use crate::models::validation::Validate;
use crate::store::Store;
use crate::utils::clock;
use crate::utils::constants::{APP_VERSION, DEFAULT_PASSWORD_ROUNDS};
use crate::utils::password;
use crate::utils::telemetry::AssessmentTelemetry;

/// Entries shown on the patient dashboard
const DASHBOARD_ENTRIES: usize = 3;

/// Shared application state
pub struct AppState {
    pub store: Arc<Store>,
    pub telemetry: Arc<AssessmentTelemetry>,
    pub rate_limiter: RateLimiter,
    /// PBKDF2 iterations for new password hashes
    pub password_rounds: u32,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, telemetry: Arc<AssessmentTelemetry>, limits: RateLimitConfig) -> Self {
        Self {
            store,
            telemetry,
            rate_limiter: RateLimiter::new(limits),
            password_rounds: DEFAULT_PASSWORD_ROUNDS,
            start_time: Instant::now(),
        }
    }

    pub fn with_password_rounds(mut self, rounds: u32) -> Self {
        self.password_rounds = rounds;
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn require_role(user: &User, role: Role) -> AppResult<()> {
    if user.role != role {
        return Err(AppError::forbidden(format!(
            "This endpoint requires the {} role",
            role.as_str()
        )));
    }
    Ok(())
}

// ============================================
// Public
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: clock::now_iso(),
        version: APP_VERSION,
        uptime_seconds: state.uptime_seconds(),
    })
}

pub async fn doctor_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<Json<DoctorCard>> {
    let doctor = state
        .store
        .doctor_by_code(&code)
        .ok_or_else(|| AppError::not_found("Doctor not found"))?;

    Ok(Json(DoctorCard {
        doctor_code: doctor.doctor_code,
        name: doctor.full_name,
        specialty: doctor.specialization,
    }))
}

pub async fn not_found() -> AppError {
    AppError::not_found("Not found")
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let password = req.password.clone();
    let rounds = state.password_rounds;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password, rounds)).await?;

    let user = accounts::register(&state.store, &req, hash)?;
    let token = state.store.issue_token(&user.id);

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(req) = payload?;

    let (user, stored) = accounts::login_account(&state.store, &req)?;
    let password = req.password.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored)).await?;
    if !verified {
        warn!(user_id = %user.id, "Login rejected");
        return Err(accounts::invalid_credentials());
    }

    accounts::complete_login(&state.store, &user, req.doctor_code.as_deref())?;
    let token = state.store.issue_token(&user.id);
    let user = state.store.user_by_id(&user.id).unwrap_or(user);
    info!(user_id = %user.id, role = user.role.as_str(), "Login");

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

// ============================================
// Any authenticated user
// ============================================

pub async fn me(Extension(user): Extension<User>) -> Json<MeResponse> {
    Json(MeResponse {
        user: PublicUser::from(&user),
    })
}

/// Stateless scoring; nothing is persisted
pub async fn score_risk(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RiskInput>, JsonRejection>,
) -> AppResult<Json<RiskOutput>> {
    let Json(input) = payload?;
    input.validate()?;

    let start = Instant::now();
    let result = compute_risk(&input);
    let latency_us = start.elapsed().as_micros() as u64;

    state.telemetry.record_assessment(&result, latency_us, "score");
    debug!(overall_risk = result.overall_risk, label = result.label.as_str(), latency_us, "Risk scored");

    Ok(Json(result))
}

// ============================================
// Provider
// ============================================

pub async fn provider_overview(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ProviderOverview>> {
    require_role(&user, Role::Provider)?;
    let today = clock::today();
    let patients = state.store.assigned_patients(&user.id, today);
    Ok(Json(assessment::build_overview(&patients, today)))
}

pub async fn provider_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<PatientList>> {
    require_role(&user, Role::Provider)?;
    let items = state.store.assigned_patients(&user.id, clock::today());
    Ok(Json(Items { items }))
}

pub async fn invite_code(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<DoctorCodeResponse>> {
    require_role(&user, Role::Provider)?;
    let doctor_code = state.store.ensure_doctor_code(&user.id)?;
    Ok(Json(DoctorCodeResponse { doctor_code }))
}

pub async fn assign_patient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> AppResult<Json<OkResponse>> {
    require_role(&user, Role::Provider)?;
    let Json(req) = payload?;

    let email = req.patient_email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::bad_request("patientEmail is required"));
    }

    let patient = state
        .store
        .user_by_email(&email)
        .filter(|u| u.role == Role::Patient)
        .ok_or_else(|| AppError::not_found("Patient not found"))?;

    if state.store.doctor_for_patient(&patient.id).is_some() {
        return Err(AppError::conflict("Patient already assigned to a doctor"));
    }

    state.store.ensure_patient_profile(&patient.id, None);
    state.store.assign_patient(&patient.id, &user.id)?;

    Ok(Json(OkResponse::ok()))
}

pub async fn assess(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<AssessRequest>, JsonRejection>,
) -> AppResult<Json<RiskOutput>> {
    require_role(&user, Role::Provider)?;
    let Json(req) = payload?;
    req.validate()?;

    let start = Instant::now();
    let result = assessment::assess_patient(&state.store, &user, req.patient_id.as_deref(), &req.input)?;
    let latency_us = start.elapsed().as_micros() as u64;

    state.telemetry.record_assessment(&result, latency_us, "assess");

    Ok(Json(result))
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ProviderAnalytics>> {
    require_role(&user, Role::Provider)?;
    let patients = state.store.assigned_patients(&user.id, clock::today());
    Ok(Json(assessment::build_analytics(
        &patients,
        state.store.assessment_label_counts(&user.id),
    )))
}

pub async fn patient_assessment_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(patient_code): Path<String>,
) -> AppResult<Json<AssessmentHistory>> {
    require_role(&user, Role::Provider)?;
    let patient_id = state
        .store
        .find_patient_for_doctor(&user.id, &patient_code)
        .ok_or_else(|| AppError::not_found("Patient not found for this doctor"))?;
    Ok(Json(history(&state.store, &patient_id)))
}

fn history(store: &Store, patient_id: &str) -> AssessmentHistory {
    let mut items = store.assessments_for(patient_id);
    items.reverse();
    Items { items }
}

// ============================================
// Patient
// ============================================

pub async fn patient_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<PatientDashboard>> {
    require_role(&user, Role::Patient)?;

    let profile = state.store.profile(&user.id);
    let doctor = state
        .store
        .doctor_for_patient(&user.id)
        .and_then(|doctor_id| state.store.user_by_id(&doctor_id))
        .map(|doctor| AssignedDoctor::from(&doctor));

    let latest_risk = profile
        .as_ref()
        .and_then(|p| p.last_assessment.clone())
        .map(|result| LatestRisk {
            summary: format!(
                "Based on your most recent assessment, your overall disease risk is {}.",
                result.label.as_str()
            ),
            result,
        });

    let mut recent_entries = state.store.health_entries(&user.id);
    recent_entries.truncate(DASHBOARD_ENTRIES);

    Ok(Json(PatientDashboard {
        user: DashboardUser {
            name: user.full_name,
            role: user.role,
        },
        patient_code: profile.map(|p| p.patient_code),
        doctor,
        latest_risk,
        recent_entries,
    }))
}

pub async fn my_assessments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<AssessmentHistory>> {
    require_role(&user, Role::Patient)?;
    Ok(Json(history(&state.store, &user.id)))
}

pub async fn patient_trends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<PatientTrends>> {
    require_role(&user, Role::Patient)?;
    Ok(Json(trends::build_trends(&state.store.health_entries(&user.id))))
}

pub async fn list_health_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> AppResult<Json<HealthEntryList>> {
    require_role(&user, Role::Patient)?;
    Ok(Json(Items {
        items: state.store.health_entries(&user.id),
    }))
}

pub async fn create_health_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<HealthEntryRequest>, JsonRejection>,
) -> AppResult<Json<OkResponse>> {
    require_role(&user, Role::Patient)?;
    let Json(req) = payload?;
    req.validate()?;

    let entry = HealthEntry {
        id: state.store.next_health_entry_id(),
        patient_user_id: user.id.clone(),
        kind: "Custom Entry".to_string(),
        value: req.summary(),
        tag: "logged".to_string(),
        recorded_at: clock::recorded_at_now(),
        raw: Some(serde_json::to_value(&req)?),
    };
    let id = entry.id.clone();
    state.store.add_health_entry(entry);

    info!(entry_id = %id, "Health entry logged");
    Ok(Json(OkResponse::with_id(id)))
}

pub async fn assistant_chat(
    Extension(user): Extension<User>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    require_role(&user, Role::Patient)?;
    let Json(req) = payload?;

    let answer = assistant::reply(&req.message)?;
    Ok(Json(ChatResponse {
        answer,
        generated_at: clock::now_iso(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            role,
            full_name: "Test".to_string(),
            email: "t@example.com".to_string(),
            phone: None,
            date_of_birth: None,
            specialization: None,
            license_number: None,
            doctor_code: None,
            password_hash: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user(Role::Provider), Role::Provider).is_ok());
        let err = require_role(&user(Role::Patient), Role::Provider).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiForbidden);
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = Arc::new(AppState::new(
            Arc::new(Store::new()),
            Arc::new(AssessmentTelemetry::new()),
            RateLimitConfig::default(),
        ));
        let Json(body) = health_check(State(state)).await;
        assert!(body.ok);
        assert!(body.time.ends_with('Z'));
    }
}
