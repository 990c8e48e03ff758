//! Caller-side input validation
//!
//! Scoring itself is total; range checks happen here, before a request
//! reaches the scoring function, and surface as client errors.

use super::errors::{AppError, AppResult};
use super::types::{non_blank, RiskInput, Role, SignupRequest};
use crate::utils::constants::MIN_PASSWORD_LEN;

/// Request types that must be checked before use
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

/// Inclusive range check for a numeric field
pub fn ensure_range<T>(field: &str, value: T, min: T, max: T) -> AppResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(AppError::out_of_range(field, min, max));
    }
    Ok(())
}

/// Like [`ensure_range`], but also rejects NaN and infinities
pub fn ensure_finite_range(field: &str, value: f64, min: f64, max: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::invalid_value(format!("{} must be a finite number", field)));
    }
    ensure_range(field, value, min, max)
}

impl Validate for RiskInput {
    fn validate(&self) -> AppResult<()> {
        ensure_range("age", self.age, 0, 120)?;
        ensure_range("systolic", self.systolic, 60, 260)?;
        ensure_range("diastolic", self.diastolic, 40, 160)?;
        ensure_range("cholesterol", self.cholesterol, 80, 400)?;
        ensure_range("bloodSugar", self.blood_sugar, 40, 600)?;
        ensure_finite_range("bmi", self.bmi, 10.0, 60.0)?;
        Ok(())
    }
}

impl Validate for SignupRequest {
    fn validate(&self) -> AppResult<()> {
        if self.full_name.trim().chars().count() < 2 || !self.email.contains('@') {
            return Err(AppError::invalid_value("Invalid name/email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_value(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.confirm_password {
            return Err(AppError::invalid_value("Passwords do not match"));
        }
        match self.role {
            Role::Provider => {
                if non_blank(self.specialization.as_deref()).is_none()
                    || non_blank(self.license_number.as_deref()).is_none()
                {
                    return Err(AppError::invalid_value(
                        "Specialization and license number are required for providers",
                    ));
                }
            }
            Role::Patient => {
                if non_blank(self.doctor_code.as_deref()).is_none() {
                    return Err(AppError::invalid_value("Doctor code is required for patients"));
                }
            }
        }
        Ok(())
    }
}
