//! Employee Model
//!
//! An [`Employee`] is always valid: every constructor and setter runs the
//! field rules from [`crate::validation`]. Whole-population rules (unique
//! username and national id) belong to the registry that owns the employees.

use super::person::Person;
use super::purchase::{Purchase, PurchaseSource};
use super::role::Role;
use crate::error::EmployeeResult;
use crate::util::format_currency;
use crate::validation::{
    validate_employee_id, validate_password, validate_salary, validate_username,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Create employee payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub name: String,
    pub surname: String,
    pub national_id: i64,
    pub salary: f64,
    pub username: String,
}

impl EmployeeCreate {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        national_id: i64,
        salary: f64,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            national_id,
            salary,
            username: username.into(),
        }
    }
}

/// Flat, persisted shape of an employee (database row / snapshot entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: i64,
    pub national_id: i64,
    pub name: String,
    pub surname: String,
    pub salary: f64,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EmployeeRecord", into = "EmployeeRecord")]
pub struct Employee {
    id: i64,
    person: Person,
    username: String,
    password: String,
    salary: f64,
    role: Role,
    is_active: bool,
}

impl Employee {
    /// Build a brand-new employee with the given id.
    ///
    /// The initial password is the national id in decimal and the account
    /// starts active. Only field rules run here; the registry checks
    /// uniqueness before handing out `id`.
    pub fn new(id: i64, data: &EmployeeCreate, role: Role) -> EmployeeResult<Self> {
        Self::build(
            id,
            Person::new(&data.name, &data.surname, data.national_id)?,
            &data.national_id.to_string(),
            &data.username,
            data.salary,
            role,
            true,
        )
    }

    /// Rebuild an employee from a trusted source (database row, snapshot,
    /// role transition). Field rules still run so corrupt data is rejected.
    pub fn reconstruct(record: EmployeeRecord) -> EmployeeResult<Self> {
        Self::build(
            record.id,
            Person::new(&record.name, &record.surname, record.national_id)?,
            &record.password,
            &record.username,
            record.salary,
            record.role,
            record.is_active,
        )
    }

    fn build(
        id: i64,
        person: Person,
        password: &str,
        username: &str,
        salary: f64,
        role: Role,
        is_active: bool,
    ) -> EmployeeResult<Self> {
        validate_employee_id(id)?;
        validate_password(password)?;
        let username = validate_username(username)?;
        validate_salary(salary)?;

        Ok(Self {
            id,
            person,
            username,
            password: password.to_string(),
            salary,
            role,
            is_active,
        })
    }

    // ========== Accessors ==========

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn person(&self) -> &Person {
        &self.person
    }

    pub fn name(&self) -> &str {
        self.person.name()
    }

    pub fn surname(&self) -> &str {
        self.person.surname()
    }

    pub fn national_id(&self) -> i64 {
        self.person.national_id()
    }

    pub fn full_name(&self) -> String {
        self.person.full_name()
    }

    /// Stored (normalized) username
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn salary(&self) -> f64 {
        self.salary
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_administrator(&self) -> bool {
        self.role.is_administrator()
    }

    // ========== Setters (re-validate) ==========

    pub fn set_salary(&mut self, salary: f64) -> EmployeeResult<()> {
        validate_salary(salary)?;
        self.salary = salary;
        Ok(())
    }

    /// Changes the stored username. Uniqueness is the registry's concern.
    pub fn set_username(&mut self, username: &str) -> EmployeeResult<()> {
        self.username = validate_username(username)?;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> EmployeeResult<()> {
        validate_password(password)?;
        self.password = password.to_string();
        Ok(())
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    // ========== Credentials ==========

    /// Exact, case-sensitive comparison. Blank candidates never match.
    pub fn check_password(&self, candidate: &str) -> bool {
        !candidate.trim().is_empty() && candidate == self.password
    }

    /// Case-insensitive username comparison
    pub fn matches_username(&self, candidate: &str) -> bool {
        self.username.to_lowercase() == candidate.to_lowercase()
    }

    // ========== Role transitions ==========

    /// Same identity, toggled role (see [`Role::toggled`]).
    pub fn with_swapped_role(&self) -> Employee {
        Employee {
            role: self.role.toggled(),
            ..self.clone()
        }
    }

    /// Same identity as an active Chief.
    pub fn as_chief(&self) -> Employee {
        Employee {
            role: Role::Chief,
            is_active: true,
            ..self.clone()
        }
    }

    // ========== Sales statistics ==========

    fn own_purchases<'a, S>(&self, source: &'a S) -> impl Iterator<Item = &'a Purchase>
    where
        S: PurchaseSource + ?Sized,
    {
        let id = self.id;
        (0..source.count())
            .filter_map(move |i| source.purchase_at(i))
            .filter(move |p| p.employee_id == id)
    }

    pub fn sales_count<S: PurchaseSource + ?Sized>(&self, source: &S) -> usize {
        self.own_purchases(source).count()
    }

    pub fn total_earnings<S: PurchaseSource + ?Sized>(&self, source: &S) -> f64 {
        self.own_purchases(source).map(|p| p.amount).sum()
    }

    /// Zero when the employee has no sales.
    pub fn average_earnings<S: PurchaseSource + ?Sized>(&self, source: &S) -> f64 {
        let count = self.sales_count(source);
        if count == 0 {
            return 0.0;
        }
        self.total_earnings(source) / count as f64
    }

    /// Multi-line summary used by the staff report screen.
    pub fn describe<S: PurchaseSource + ?Sized>(&self, source: &S) -> String {
        let mut out = self.person.to_string();
        // Writing into a String cannot fail
        let _ = writeln!(out, "Id: {}", self.id);
        let _ = writeln!(out, "Role: {}", self.role);
        let _ = writeln!(out, "Username: {}", self.username);
        let _ = writeln!(out, "Salary: {}", format_currency(self.salary));
        let _ = writeln!(out, "Sales: {}", self.sales_count(source));
        let _ = writeln!(
            out,
            "Total earnings: {}",
            format_currency(self.total_earnings(source))
        );
        let _ = writeln!(
            out,
            "Average earnings: {}",
            format_currency(self.average_earnings(source))
        );
        out
    }

    pub fn to_record(&self) -> EmployeeRecord {
        EmployeeRecord {
            id: self.id,
            national_id: self.person.national_id(),
            name: self.person.name().to_string(),
            surname: self.person.surname().to_string(),
            salary: self.salary,
            username: self.username.clone(),
            password: self.password.clone(),
            role: self.role,
            is_active: self.is_active,
        }
    }
}

impl TryFrom<EmployeeRecord> for Employee {
    type Error = crate::error::EmployeeError;

    fn try_from(record: EmployeeRecord) -> Result<Self, Self::Error> {
        Employee::reconstruct(record)
    }
}

impl From<Employee> for EmployeeRecord {
    fn from(employee: Employee) -> Self {
        employee.to_record()
    }
}
