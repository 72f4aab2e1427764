//! Shared types for the design-shop staff directory
//!
//! Entity model, field validation and error vocabulary used by
//! `staff-directory` and by any upward collaborator (forms, CLI, reports).

pub mod error;
pub mod models;
pub mod util;
pub mod validation;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, EmployeeError, EmployeeResult, ErrorCategory, ErrorCode};
pub use models::{
    Employee, EmployeeCreate, EmployeeRecord, Person, Purchase, PurchaseLedger, PurchaseSource,
    Role,
};
