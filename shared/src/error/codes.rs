//! Numeric error codes handed to upward collaborators
//!
//! The thousands digit selects the category (see [`super::ErrorCategory`]):
//! 0xxx general, 1xxx authentication, 2xxx permission, 8xxx employee data,
//! 9xxx system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every code the directory can report.
///
/// Serialized as its `u16` value so non-Rust front ends can switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    /// A field value broke a validation rule
    ValidationFailed = 2,
    /// A required value was blank or absent
    RequiredField = 7,

    /// Login rejected
    InvalidCredentials = 1002,

    /// Actor lacks the capability, is inactive, or is unknown
    PermissionDenied = 2001,

    UsernameTaken = 8002,
    NationalIdTaken = 8006,

    /// The employee store failed
    DatabaseError = 9002,
}

impl ErrorCode {
    const ALL: [ErrorCode; 7] = [
        ErrorCode::ValidationFailed,
        ErrorCode::RequiredField,
        ErrorCode::InvalidCredentials,
        ErrorCode::PermissionDenied,
        ErrorCode::UsernameTaken,
        ErrorCode::NationalIdTaken,
        ErrorCode::DatabaseError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default English message used when no custom message is attached
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::UsernameTaken => "Username is already taken",
            ErrorCode::NationalIdTaken => "National id is already registered",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_parses_back() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(0u16), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(8001u16), Err(InvalidErrorCode(8001)));
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(ErrorCode::RequiredField.to_string(), "E0007");
        assert_eq!(ErrorCode::UsernameTaken.to_string(), "E8002");
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::NationalIdTaken).unwrap();
        assert_eq!(json, "8006");
        let back: ErrorCode = serde_json::from_str("1002").unwrap();
        assert_eq!(back, ErrorCode::InvalidCredentials);
        assert!(serde_json::from_str::<ErrorCode>("1").is_err());
    }
}
