//! Role Model
//!
//! Closed role hierarchy: Employee < Administrator < Chief.
//! Logging in needs no permission; every administrative operation is gated
//! by one of the permission strings below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ── Permissions ─────────────────────────────────────────────────────

/// Register new employees
pub const PERM_EMPLOYEES_CREATE: &str = "employees:create";
/// Toggle Employee <-> Administrator
pub const PERM_EMPLOYEES_PROMOTE: &str = "employees:promote";
/// Make someone Chief
pub const PERM_EMPLOYEES_ASSIGN_CHIEF: &str = "employees:assign_chief";
/// Change salary, deactivate or reactivate
pub const PERM_EMPLOYEES_MANAGE: &str = "employees:manage";
/// Regenerate the snapshot file on demand
pub const PERM_SNAPSHOT_SAVE: &str = "snapshot:save";

const EMPLOYEE_PERMISSIONS: &[&str] = &[];

const ADMINISTRATOR_PERMISSIONS: &[&str] = &[
    PERM_EMPLOYEES_CREATE,
    PERM_EMPLOYEES_PROMOTE,
    PERM_EMPLOYEES_MANAGE,
    PERM_SNAPSHOT_SAVE,
];

const CHIEF_PERMISSIONS: &[&str] = &[
    PERM_EMPLOYEES_CREATE,
    PERM_EMPLOYEES_PROMOTE,
    PERM_EMPLOYEES_ASSIGN_CHIEF,
    PERM_EMPLOYEES_MANAGE,
    PERM_SNAPSHOT_SAVE,
];

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Employee,
    Administrator,
    Chief,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Administrator => "administrator",
            Role::Chief => "chief",
        }
    }

    /// Any role other than plain `Employee`
    pub const fn is_administrator(&self) -> bool {
        !matches!(self, Role::Employee)
    }

    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Employee => EMPLOYEE_PERMISSIONS,
            Role::Administrator => ADMINISTRATOR_PERMISSIONS,
            Role::Chief => CHIEF_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn can_register_employees(&self) -> bool {
        self.has_permission(PERM_EMPLOYEES_CREATE)
    }

    pub fn can_promote(&self) -> bool {
        self.has_permission(PERM_EMPLOYEES_PROMOTE)
    }

    pub fn can_assign_chief(&self) -> bool {
        self.has_permission(PERM_EMPLOYEES_ASSIGN_CHIEF)
    }

    pub fn can_manage_employees(&self) -> bool {
        self.has_permission(PERM_EMPLOYEES_MANAGE)
    }

    pub fn can_save_snapshot(&self) -> bool {
        self.has_permission(PERM_SNAPSHOT_SAVE)
    }

    /// Role after a promotion toggle.
    ///
    /// Employee and Chief become Administrator; Administrator becomes Employee.
    pub const fn toggled(&self) -> Role {
        match self {
            Role::Employee | Role::Chief => Role::Administrator,
            Role::Administrator => Role::Employee,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Employee => "Employee",
            Role::Administrator => "Administrator",
            Role::Chief => "Chief",
        };
        f.write_str(label)
    }
}

/// Unknown role name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "administrator" => Ok(Role::Administrator),
            "chief" => Ok(Role::Chief),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}
