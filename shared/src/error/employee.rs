//! Domain errors raised by the employee model, the registry and persistence
//!
//! Every violated invariant has its own [`DataViolation`] so callers can branch
//! on the exact rule that failed. Validation stops at the first violation.

use super::codes::ErrorCode;
use super::types::AppError;
use thiserror::Error;

/// A single field-level invariant that was not met
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataViolation {
    #[error("Salary must be greater than zero (got {0})")]
    NonPositiveSalary(f64),

    #[error("Username must be between {min} and {max} characters")]
    UsernameLength { min: usize, max: usize },

    #[error("Username may only contain letters and digits")]
    UsernameCharset,

    #[error("Password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },

    #[error("Password may only contain letters and digits")]
    PasswordCharset,

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("An employee with national id {0} already exists")]
    DuplicateNationalId(i64),

    #[error("National id must be greater than zero (got {0})")]
    NonPositiveNationalId(i64),

    #[error("Employee id cannot be negative (got {0})")]
    NegativeId(i64),

    #[error("Employee id {0} leaves no room for further ids")]
    IdSpaceExhausted(i64),
}

/// Employee domain error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmployeeError {
    /// Field-level constraint violation, including uniqueness
    #[error("Invalid data: {0}")]
    InvalidData(#[from] DataViolation),

    /// Null/blank required string, or a missing required object
    #[error("Missing required value: {0}")]
    MissingRequiredValue(String),

    /// No registry entry matches; never says which part was wrong
    #[error("Invalid username or password")]
    AuthenticationFailure,

    /// The acting employee's role does not grant the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Relational store write/read failed
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl EmployeeError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingRequiredValue(what.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// The violated rule, if this is an `InvalidData` error
    pub fn violation(&self) -> Option<&DataViolation> {
        match self {
            Self::InvalidData(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_invalid_data(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }

    /// Error code used when this error leaves the core
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidData(DataViolation::DuplicateUsername(_)) => {
                ErrorCode::UsernameTaken
            }
            Self::InvalidData(DataViolation::DuplicateNationalId(_)) => {
                ErrorCode::NationalIdTaken
            }
            Self::InvalidData(_) => ErrorCode::ValidationFailed,
            Self::MissingRequiredValue(_) => ErrorCode::RequiredField,
            Self::AuthenticationFailure => ErrorCode::InvalidCredentials,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Persistence(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<EmployeeError> for AppError {
    fn from(err: EmployeeError) -> Self {
        let code = err.error_code();
        match err {
            // Credentials failures keep the generic message only
            EmployeeError::AuthenticationFailure => AppError::invalid_credentials(),
            EmployeeError::MissingRequiredValue(what) => AppError::required(what),
            // Storage internals stay in the logs
            EmployeeError::Persistence(_) => AppError::new(code),
            other => AppError::with_message(code, other.to_string()),
        }
    }
}

/// Result type for employee operations
pub type EmployeeResult<T> = Result<T, EmployeeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_converts_into_invalid_data() {
        let err: EmployeeError = DataViolation::UsernameCharset.into();
        assert!(err.is_invalid_data());
        assert_eq!(err.violation(), Some(&DataViolation::UsernameCharset));
    }

    #[test]
    fn test_duplicate_username_maps_to_employee_code() {
        let err = EmployeeError::from(DataViolation::DuplicateUsername("Anal".into()));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::UsernameTaken);
        assert_eq!(app.message, "Invalid data: Username 'Anal' already exists");
    }

    #[test]
    fn test_authentication_failure_is_generic() {
        let app: AppError = EmployeeError::AuthenticationFailure.into();
        assert_eq!(app.code, ErrorCode::InvalidCredentials);
        assert_eq!(app.message, "Invalid username or password");
        assert!(app.details.is_none());
    }

    #[test]
    fn test_persistence_hides_storage_detail() {
        let app: AppError = EmployeeError::persistence("UNIQUE constraint failed").into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert_eq!(app.message, "Database error");
    }

    #[test]
    fn test_missing_value_maps_to_required_field() {
        let app: AppError = EmployeeError::missing("username").into();
        assert_eq!(app.code, ErrorCode::RequiredField);
        assert_eq!(app.message, "username is required");
    }
}
