//! In-memory employee registry
//!
//! The single authoritative, process-wide collection of employees. Reads take
//! a shared lock; every mutation (including the create-time uniqueness
//! checks) runs under one exclusive lock acquisition.
//!
//! Creation comes in two shapes. [`EmployeeRegistry::create`] validates and
//! appends in one step. [`EmployeeRegistry::reserve`] and
//! [`EmployeeRegistry::publish`] split it so a caller can persist the record
//! elsewhere first; a reserved employee is invisible to readers (and to
//! snapshots) until it is published.

use parking_lot::RwLock;
use shared::error::{DataViolation, EmployeeError, EmployeeResult};
use shared::models::{Employee, EmployeeCreate, NationalIdLookup, Role};

/// First id handed out by an empty registry
const FIRST_ID: i64 = 1;

#[derive(Debug)]
struct RegistryState {
    /// Insertion order; the authentication scan walks it front to back
    employees: Vec<Employee>,
    /// Never goes backwards, so reserved ids are not handed out twice
    next_id: i64,
}

impl RegistryState {
    fn position(&self, id: i64) -> Option<usize> {
        self.employees.iter().position(|e| e.id() == id)
    }

    fn exists_username(&self, candidate: &str) -> bool {
        self.employees.iter().any(|e| e.matches_username(candidate))
    }

    fn check_unique(&self, employee: &Employee) -> EmployeeResult<()> {
        if self.exists_national_id(employee.national_id()) {
            return Err(DataViolation::DuplicateNationalId(employee.national_id()).into());
        }
        if self.exists_username(employee.username()) {
            return Err(DataViolation::DuplicateUsername(employee.username().to_string()).into());
        }
        Ok(())
    }

    /// Counter value that stays above every id in `employees`
    fn next_id_after(&self, employees: &[Employee]) -> EmployeeResult<i64> {
        match employees.iter().map(Employee::id).max() {
            Some(max) => {
                let after = max
                    .checked_add(1)
                    .ok_or(DataViolation::IdSpaceExhausted(max))?;
                Ok(self.next_id.max(after))
            }
            None => Ok(self.next_id),
        }
    }

    fn reserve(&mut self, data: &EmployeeCreate, role: Role) -> EmployeeResult<Employee> {
        let id = self.next_id;
        let following = id
            .checked_add(1)
            .ok_or(DataViolation::IdSpaceExhausted(id))?;
        let employee = Employee::new(id, data, role)?;
        self.check_unique(&employee)?;
        self.next_id = following;
        Ok(employee)
    }
}

impl NationalIdLookup for RegistryState {
    fn exists_national_id(&self, national_id: i64) -> bool {
        self.employees
            .iter()
            .any(|e| e.national_id() == national_id)
    }
}

/// Owned employee registry, shared behind an `Arc`
#[derive(Debug)]
pub struct EmployeeRegistry {
    state: RwLock<RegistryState>,
}

impl EmployeeRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                employees: Vec::new(),
                next_id: FIRST_ID,
            }),
        }
    }

    /// Registry pre-filled from a trusted source (store or snapshot)
    pub fn with_employees(employees: Vec<Employee>) -> EmployeeResult<Self> {
        let registry = Self::new();
        registry.replace_all(employees)?;
        Ok(registry)
    }

    /// Swap the whole population, keeping the id counter monotonic.
    ///
    /// Refused, with nothing changed, when the highest id leaves no id to
    /// hand out next.
    pub fn replace_all(&self, employees: Vec<Employee>) -> EmployeeResult<()> {
        let mut state = self.state.write();
        state.next_id = state.next_id_after(&employees)?;
        state.employees = employees;
        Ok(())
    }

    // ========== Queries ==========

    pub fn count(&self) -> usize {
        self.state.read().employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().employees.is_empty()
    }

    /// Employee at `index` in registry order
    pub fn by_index(&self, index: usize) -> EmployeeResult<Employee> {
        self.state
            .read()
            .employees
            .get(index)
            .cloned()
            .ok_or_else(|| EmployeeError::missing(format!("employee at index {index}")))
    }

    pub fn find_by_id(&self, id: i64) -> Option<Employee> {
        let state = self.state.read();
        state.position(id).map(|i| state.employees[i].clone())
    }

    /// Case-insensitive
    pub fn exists_username(&self, candidate: &str) -> bool {
        self.state.read().exists_username(candidate)
    }

    pub fn exists_national_id(&self, national_id: i64) -> bool {
        self.state.read().exists_national_id(national_id)
    }

    /// Id the next successful creation will receive
    pub fn next_id(&self) -> i64 {
        self.state.read().next_id
    }

    /// Point-in-time copy of every employee, in registry order
    pub fn employees(&self) -> Vec<Employee> {
        self.state.read().employees.clone()
    }

    // ========== Authentication ==========

    /// First employee (registry order) whose username matches ignoring case
    /// and whose password matches exactly.
    ///
    /// Does not say whether the username or the password was wrong.
    pub fn authenticate(&self, username: &str, password: &str) -> EmployeeResult<Employee> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(EmployeeError::AuthenticationFailure);
        }
        self.state
            .read()
            .employees
            .iter()
            .find(|e| e.matches_username(username) && e.check_password(password))
            .cloned()
            .ok_or(EmployeeError::AuthenticationFailure)
    }

    // ========== Mutations ==========

    /// Validate, check uniqueness (national id, then username), assign the
    /// next id and append. Nothing is consumed when a check fails.
    pub fn create(&self, data: &EmployeeCreate, role: Role) -> EmployeeResult<Employee> {
        let mut state = self.state.write();
        let employee = state.reserve(data, role)?;
        state.employees.push(employee.clone());
        Ok(employee)
    }

    /// Run the checks of [`create`](Self::create) and consume the id, but
    /// leave the registry contents unchanged.
    ///
    /// The id stays consumed even if the reservation is never published.
    pub fn reserve(&self, data: &EmployeeCreate, role: Role) -> EmployeeResult<Employee> {
        self.state.write().reserve(data, role)
    }

    /// [`reserve`](Self::reserve), but only while the registry is empty
    pub fn reserve_first(
        &self,
        data: &EmployeeCreate,
        role: Role,
    ) -> EmployeeResult<Option<Employee>> {
        let mut state = self.state.write();
        if !state.employees.is_empty() {
            return Ok(None);
        }
        state.reserve(data, role).map(Some)
    }

    /// Append a reserved employee. Uniqueness is checked again, since other
    /// entries may have been added since the reservation.
    pub fn publish(&self, employee: Employee) -> EmployeeResult<()> {
        let mut state = self.state.write();
        state.check_unique(&employee)?;
        state.next_id = state.next_id_after(std::slice::from_ref(&employee))?;
        state.employees.push(employee);
        Ok(())
    }

    /// Replace the entry with the same id, keeping its position
    pub fn replace(&self, employee: Employee) -> EmployeeResult<()> {
        let mut state = self.state.write();
        let index = state
            .position(employee.id())
            .ok_or_else(|| EmployeeError::missing(format!("employee {}", employee.id())))?;
        state.employees[index] = employee;
        Ok(())
    }

    /// Apply `f` to the entry with `id` and return the updated copy.
    ///
    /// The stored entry only changes when `f` succeeds.
    pub fn update<F>(&self, id: i64, f: F) -> EmployeeResult<Employee>
    where
        F: FnOnce(&mut Employee) -> EmployeeResult<()>,
    {
        let mut state = self.state.write();
        let index = state
            .position(id)
            .ok_or_else(|| EmployeeError::missing(format!("employee {id}")))?;
        let mut updated = state.employees[index].clone();
        f(&mut updated)?;
        state.employees[index] = updated.clone();
        Ok(updated)
    }
}

impl Default for EmployeeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NationalIdLookup for EmployeeRegistry {
    fn exists_national_id(&self, national_id: i64) -> bool {
        EmployeeRegistry::exists_national_id(self, national_id)
    }
}
