//! Account signup and login
//!
//! Password hashing is CPU-bound, so callers hash and verify outside
//! these functions (on the blocking pool) and pass the results in.

use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{LoginRequest, Role, SignupRequest, User};
use crate::store::Store;

const INVALID_CREDENTIALS: &str = "Invalid email/password";

/// Create the account described by a validated signup.
///
/// Providers get a doctor code; patients get a profile and are linked to
/// the doctor whose code they supplied. An unknown doctor code fails
/// before anything is written.
pub fn register(store: &Store, req: &SignupRequest, password_hash: String) -> AppResult<User> {
    if store.user_by_email(&req.email).is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let doctor = match req.role {
        Role::Patient => Some(resolve_doctor(store, req.doctor_code.as_deref().unwrap_or(""))?),
        Role::Provider => None,
    };

    let user = store.insert_user(req.to_new_user(password_hash))?;
    match doctor {
        Some(doctor) => {
            store.ensure_patient_profile(&user.id, req.gender);
            store.assign_patient(&user.id, &doctor.id)?;
        }
        None => {
            store.ensure_doctor_code(&user.id)?;
        }
    }

    info!(user_id = %user.id, role = user.role.as_str(), "Account registered");
    Ok(store.user_by_id(&user.id).unwrap_or(user))
}

/// Account for a login attempt plus its stored hash.
///
/// Unknown emails, role mismatches and token-only accounts all fail the
/// same way, so responses do not reveal which emails exist.
pub fn login_account(store: &Store, req: &LoginRequest) -> AppResult<(User, String)> {
    let user = store
        .user_by_email(&req.email)
        .filter(|u| u.role == req.role)
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;
    let hash = user
        .password_hash
        .clone()
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;
    Ok((user, hash))
}

/// Failure for a password that did not verify
pub fn invalid_credentials() -> AppError {
    AppError::unauthorized(INVALID_CREDENTIALS)
}

/// Post-verification bookkeeping: providers keep a doctor code, patients
/// keep a profile and must end up linked to a doctor.
pub fn complete_login(store: &Store, user: &User, doctor_code: Option<&str>) -> AppResult<()> {
    match user.role {
        Role::Provider => {
            store.ensure_doctor_code(&user.id)?;
        }
        Role::Patient => {
            store.ensure_patient_profile(&user.id, None);
            if store.doctor_for_patient(&user.id).is_none() {
                let code = doctor_code.map(str::trim).filter(|c| !c.is_empty()).ok_or_else(|| {
                    AppError::conflict("Patient not assigned to a doctor. Provide doctorCode to link.")
                })?;
                let doctor = resolve_doctor(store, code)?;
                // A concurrent login may have linked the patient already
                if let Err(e) = store.assign_patient(&user.id, &doctor.id) {
                    if store.doctor_for_patient(&user.id).is_none() {
                        return Err(e);
                    }
                }
            }
        }
    }
    Ok(())
}

fn resolve_doctor(store: &Store, code: &str) -> AppResult<User> {
    store
        .doctor_by_code(code)
        .ok_or_else(|| AppError::invalid_value("Invalid doctor code"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use crate::models::types::NewUser;

    fn store_with_doctor() -> (Store, User, String) {
        let store = Store::new();
        let doctor = store
            .insert_user(NewUser {
                role: Role::Provider,
                full_name: "Dr. Test".to_string(),
                email: "dr@example.com".to_string(),
                phone: None,
                date_of_birth: None,
                specialization: Some("Cardiology".to_string()),
                license_number: Some("LIC-1".to_string()),
                password_hash: None,
            })
            .unwrap();
        let code = store.ensure_doctor_code(&doctor.id).unwrap();
        (store, doctor, code)
    }

    fn patient_signup(email: &str, doctor_code: &str) -> SignupRequest {
        serde_json::from_value(serde_json::json!({
            "role": "patient",
            "fullName": "Pat Test",
            "email": email,
            "password": "secret1",
            "confirmPassword": "secret1",
            "gender": "Female",
            "doctorCode": doctor_code,
        }))
        .unwrap()
    }

    fn login(role: &str, email: &str, doctor_code: Option<&str>) -> LoginRequest {
        serde_json::from_value(serde_json::json!({
            "role": role,
            "email": email,
            "password": "secret1",
            "doctorCode": doctor_code,
        }))
        .unwrap()
    }

    #[test]
    fn test_patient_signup_links_doctor() {
        let (store, doctor, code) = store_with_doctor();
        let user = register(&store, &patient_signup("pat@example.com", &code.to_lowercase()), "h".into()).unwrap();

        assert_eq!(user.role, Role::Patient);
        assert_eq!(store.doctor_for_patient(&user.id), Some(doctor.id));
        assert_eq!(store.profile(&user.id).unwrap().patient_code, "P001");
    }

    #[test]
    fn test_provider_signup_gets_doctor_code() {
        let store = Store::new();
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "role": "provider",
            "fullName": "Dr. New",
            "email": "new@example.com",
            "password": "secret1",
            "confirmPassword": "secret1",
            "specialization": "Endocrinology",
            "licenseNumber": "LIC-9",
        }))
        .unwrap();
        let user = register(&store, &req, "h".into()).unwrap();
        assert!(user.doctor_code.unwrap().starts_with("DR-"));
        assert_eq!(user.specialization.as_deref(), Some("Endocrinology"));
    }

    #[test]
    fn test_signup_failures_write_nothing() {
        let (store, _, code) = store_with_doctor();

        let err = register(&store, &patient_signup("pat@example.com", "DR-NOPE0000"), "h".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationInvalidValue);
        assert!(store.user_by_email("pat@example.com").is_none());

        let err = register(&store, &patient_signup("DR@example.com", &code), "h".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiConflict);
    }

    #[test]
    fn test_login_account_lookup() {
        let (store, _, code) = store_with_doctor();
        register(&store, &patient_signup("pat@example.com", &code), "stored".into()).unwrap();

        let (user, hash) = login_account(&store, &login("patient", " Pat@Example.com", None)).unwrap();
        assert_eq!(user.email, "pat@example.com");
        assert_eq!(hash, "stored");

        // Wrong role, unknown email and token-only accounts look the same
        for req in [
            login("provider", "pat@example.com", None),
            login("patient", "nobody@example.com", None),
            login("provider", "dr@example.com", None),
        ] {
            let err = login_account(&store, &req).unwrap_err();
            assert_eq!(err.code, ErrorCode::ApiUnauthorized);
            assert_eq!(err.message, "Invalid email/password");
        }
    }

    #[test]
    fn test_complete_login_requires_doctor_link() {
        let (store, doctor, code) = store_with_doctor();
        let patient = store
            .insert_user(NewUser {
                role: Role::Patient,
                full_name: "Loose Patient".to_string(),
                email: "loose@example.com".to_string(),
                phone: None,
                date_of_birth: None,
                specialization: None,
                license_number: None,
                password_hash: Some("h".to_string()),
            })
            .unwrap();

        let err = complete_login(&store, &patient, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiConflict);

        let err = complete_login(&store, &patient, Some("DR-NOPE0000")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationInvalidValue);

        complete_login(&store, &patient, Some(code.as_str())).unwrap();
        assert_eq!(store.doctor_for_patient(&patient.id), Some(doctor.id));
        // Linked now; the code is no longer needed
        complete_login(&store, &patient, None).unwrap();
    }
}
