//! Unified error system for the staff directory
//!
//! - [`ErrorCode`]: Standardized numeric error codes
//! - [`ErrorCategory`]: Classification of errors by code range
//! - [`AppError`]: Error carried to upward collaborators (code, message, details)
//! - [`EmployeeError`]: Domain error raised by the entity model, registry and persistence
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 8xxx: Employee errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, DataViolation, EmployeeError, ErrorCode};
//!
//! let err: EmployeeError = DataViolation::NonPositiveSalary(0.0).into();
//! let app: AppError = err.into();
//! assert_eq!(app.code, ErrorCode::ValidationFailed);
//! ```

mod category;
mod codes;
mod employee;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use employee::{DataViolation, EmployeeError, EmployeeResult};
pub use types::{AppError, AppResult};
