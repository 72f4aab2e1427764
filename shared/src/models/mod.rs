//! Staff entity model

pub mod employee;
pub mod person;
pub mod purchase;
pub mod role;

// Re-exports
pub use employee::{Employee, EmployeeCreate, EmployeeRecord};
pub use person::{NationalIdLookup, Person};
pub use purchase::{Purchase, PurchaseLedger, PurchaseSource};
pub use role::{ParseRoleError, Role};
