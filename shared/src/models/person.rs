//! Person Model

use crate::error::{DataViolation, EmployeeResult};
use crate::validation::{validate_national_id, validate_required_text};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Duplicate-national-id lookup for one kind of person.
///
/// Each kind (employees, customers, ...) has its own id space, so the check is
/// supplied by whoever owns that population.
pub trait NationalIdLookup {
    fn exists_national_id(&self, national_id: i64) -> bool;
}

/// Base identity shared by every kind of person in the shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    name: String,
    surname: String,
    national_id: i64,
}

impl Person {
    /// Build a person after field validation only.
    pub fn new(name: &str, surname: &str, national_id: i64) -> EmployeeResult<Self> {
        let name = validate_required_text(name, "name")?;
        let surname = validate_required_text(surname, "surname")?;
        validate_national_id(national_id)?;

        Ok(Self {
            name: name.to_string(),
            surname: surname.to_string(),
            national_id,
        })
    }

    /// Build a person whose national id must not exist yet in `lookup`.
    pub fn new_unique(
        name: &str,
        surname: &str,
        national_id: i64,
        lookup: &impl NationalIdLookup,
    ) -> EmployeeResult<Self> {
        let person = Self::new(name, surname, national_id)?;
        if lookup.exists_national_id(national_id) {
            return Err(DataViolation::DuplicateNationalId(national_id).into());
        }
        Ok(person)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn national_id(&self) -> i64 {
        self.national_id
    }

    /// "Surname, Name"
    pub fn full_name(&self) -> String {
        format!("{}, {}", self.surname, self.name)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.full_name())?;
        writeln!(f, "National id: {}", self.national_id)
    }
}
