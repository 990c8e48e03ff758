//! Centralized Error Handling Module
//!
//! Every failure carries a unique, stable error code so logs and API
//! clients can tell them apart.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - API_xxx: request/authorization errors
//! - VALIDATION_xxx: input range and membership errors
//! - STORE_xxx: storage errors
//! - CFG_xxx: configuration errors

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // API Errors
    // ============================================
    /// Malformed body or missing required field
    ApiBadRequest,
    /// Missing or unknown bearer token
    ApiUnauthorized,
    /// Authenticated, but wrong role
    ApiForbidden,
    /// Resource not found
    ApiNotFound,
    /// Resource already exists or is already linked
    ApiConflict,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Validation Errors
    // ============================================
    /// Numeric field outside its accepted range
    ValidationOutOfRange,
    /// Field present but unusable (empty, malformed)
    ValidationInvalidValue,

    // ============================================
    // Store Errors
    // ============================================
    /// Unique key already taken
    StoreDuplicateKey,
    /// Could not allocate a unique code
    StoreCodeExhausted,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiForbidden => "API_FORBIDDEN",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiConflict => "API_CONFLICT",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ValidationOutOfRange => "VALIDATION_OUT_OF_RANGE",
            Self::ValidationInvalidValue => "VALIDATION_INVALID_VALUE",

            Self::StoreDuplicateKey => "STORE_DUPLICATE_KEY",
            Self::StoreCodeExhausted => "STORE_CODE_EXHAUSTED",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ValidationOutOfRange | Self::ValidationInvalidValue => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiForbidden => 403,
            Self::ApiNotFound => 404,
            Self::ApiConflict | Self::StoreDuplicateKey => 409,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Client errors are logged at warn, everything else at error
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiUnauthorized, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiForbidden, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotFound, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiConflict, msg)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self::new(
            ErrorCode::ApiRateLimited,
            format!("Rate limit exceeded. Retry after {} seconds", retry_after),
        )
    }

    pub fn out_of_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ValidationOutOfRange,
            format!("{} must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationInvalidValue, msg)
    }

    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", key, value),
        )
    }
}

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// HTTP rendering
// ============================================

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.code.is_client_error() {
            tracing::warn!(code = self.code_str(), status = status.as_u16(), "{}", self.message);
        } else {
            error!(code = self.code_str(), status = status.as_u16(), error = ?self.source, "{}", self.message);
        }

        let body = ErrorBody {
            detail: &self.message,
            code: self.code_str(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================
// Conversion from common error types
// ============================================

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::with_source(ErrorCode::ApiInternalError, "Background task failed", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ApiInternalError, "JSON encode error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::not_found("Patient not found for this doctor");
        assert_eq!(err.code, ErrorCode::ApiNotFound);
        assert_eq!(err.code_str(), "API_NOT_FOUND");
        assert_eq!(err.to_string(), "[API_NOT_FOUND] Patient not found for this doctor");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ValidationOutOfRange.http_status(), 400);
        assert_eq!(ErrorCode::ApiUnauthorized.http_status(), 401);
        assert_eq!(ErrorCode::ApiForbidden.http_status(), 403);
        assert_eq!(ErrorCode::StoreDuplicateKey.http_status(), 409);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::StoreCodeExhausted.http_status(), 500);
    }

    #[test]
    fn test_out_of_range_message() {
        let err = AppError::out_of_range("age", 0, 120);
        assert_eq!(err.message, "age must be between 0 and 120");
        assert!(err.code.is_client_error());
    }

    #[tokio::test]
    async fn test_failed_background_task_is_internal() {
        let join_err = tokio::task::spawn_blocking(|| panic!("hash worker died"))
            .await
            .unwrap_err();
        let err = AppError::from(join_err);
        assert_eq!(err.code, ErrorCode::ApiInternalError);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.code.is_client_error());
    }
}
