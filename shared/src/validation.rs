//! Field validation rules for staff records
//!
//! Every rule returns the first violation it finds. Credential rules follow
//! what the shop's login screen accepts: 4 to 8 letters or digits.

use crate::error::{DataViolation, EmployeeError, EmployeeResult};

// ── Length limits ───────────────────────────────────────────────────

/// Minimum username length (chars)
pub const USERNAME_MIN_LEN: usize = 4;

/// Maximum username length (chars)
pub const USERNAME_MAX_LEN: usize = 8;

/// Minimum password length (chars)
pub const PASSWORD_MIN_LEN: usize = 4;

/// Maximum password length (chars)
pub const PASSWORD_MAX_LEN: usize = 8;

// ── Helpers ─────────────────────────────────────────────────────────

/// Letters and digits only (any script).
pub fn is_alphanumeric(value: &str) -> bool {
    value.chars().all(char::is_alphanumeric)
}

/// Stored form of a username: first letter upper case, the rest lower case.
pub fn normalize_username(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Reject blank strings; returns the trimmed value.
pub fn validate_required_text<'a>(value: &'a str, field: &str) -> EmployeeResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EmployeeError::missing(field));
    }
    Ok(trimmed)
}

// ── Field rules ─────────────────────────────────────────────────────

fn check_username_shape(value: &str) -> EmployeeResult<()> {
    let len = value.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(DataViolation::UsernameLength {
            min: USERNAME_MIN_LEN,
            max: USERNAME_MAX_LEN,
        }
        .into());
    }
    if !is_alphanumeric(value) {
        return Err(DataViolation::UsernameCharset.into());
    }
    Ok(())
}

/// Validate a username and return its normalized form.
///
/// Case mapping can grow a string ('ß' upper-cases to "SS") or introduce
/// combining marks, so the normalized form must pass the same rules and
/// normalize to itself. Reloading a stored username never changes it.
pub fn validate_username(value: &str) -> EmployeeResult<String> {
    if value.trim().is_empty() {
        return Err(EmployeeError::missing("username"));
    }
    check_username_shape(value)?;
    let normalized = normalize_username(value);
    check_username_shape(&normalized)?;
    if normalize_username(&normalized) != normalized {
        return Err(DataViolation::UsernameCharset.into());
    }
    Ok(normalized)
}

/// Validate a password. Passwords are stored exactly as given.
pub fn validate_password(value: &str) -> EmployeeResult<()> {
    if value.trim().is_empty() {
        return Err(EmployeeError::missing("password"));
    }
    let len = value.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(DataViolation::PasswordLength {
            min: PASSWORD_MIN_LEN,
            max: PASSWORD_MAX_LEN,
        }
        .into());
    }
    if !is_alphanumeric(value) {
        return Err(DataViolation::PasswordCharset.into());
    }
    Ok(())
}

pub fn validate_salary(value: f64) -> EmployeeResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DataViolation::NonPositiveSalary(value).into())
    }
}

pub fn validate_national_id(value: i64) -> EmployeeResult<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(DataViolation::NonPositiveNationalId(value).into())
    }
}

pub fn validate_employee_id(value: i64) -> EmployeeResult<()> {
    if value >= 0 {
        Ok(())
    } else {
        Err(DataViolation::NegativeId(value).into())
    }
}
