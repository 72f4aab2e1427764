//! Staff directory service
//!
//! Orchestrates the registry, the relational store and the snapshot worker.
//! Every mutation follows the same order:
//!
//! 1. authorize the acting employee
//! 2. validate on a copy of the current record
//! 3. write the relational store (awaited, authoritative)
//! 4. apply the change to the registry
//! 5. schedule a snapshot (never awaited)
//!
//! A new employee is reserved in the registry (id and uniqueness) but only
//! published after the store accepts it, so a snapshot taken meanwhile
//! cannot contain a record the store may still reject.
//!
//! Mutations are serialized by an async gate so a store write and the matching
//! registry update are never interleaved with another mutation. Reads and
//! authentication only touch the registry.

use crate::db::repository::EmployeeStore;
use crate::registry::EmployeeRegistry;
use crate::snapshot::{self, SnapshotHandle, SnapshotTicket, SnapshotWaitError};
use shared::error::{EmployeeError, EmployeeResult};
use shared::models::{Employee, EmployeeCreate, PurchaseSource, Role};
use shared::validation::validate_password;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where the registry was filled from at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    Snapshot,
    Store,
}

#[derive(Clone)]
pub struct StaffDirectory {
    registry: Arc<EmployeeRegistry>,
    store: Arc<dyn EmployeeStore>,
    snapshot: SnapshotHandle,
    mutations: Arc<Mutex<()>>,
}

impl StaffDirectory {
    /// Wrap already-loaded parts. Use [`bootstrap`](Self::bootstrap) at startup.
    pub fn new(
        registry: Arc<EmployeeRegistry>,
        store: Arc<dyn EmployeeStore>,
        snapshot: SnapshotHandle,
    ) -> Self {
        Self {
            registry,
            store,
            snapshot,
            mutations: Arc::new(Mutex::new(())),
        }
    }

    /// Fill the registry from the snapshot file, or from the store when the
    /// file is missing, unreadable or unloadable (then a fresh snapshot is
    /// scheduled). Fails when the store contents cannot be loaded either.
    pub async fn bootstrap(
        registry: Arc<EmployeeRegistry>,
        store: Arc<dyn EmployeeStore>,
        snapshot_path: &Path,
        handle: SnapshotHandle,
    ) -> EmployeeResult<(Self, BootstrapSource)> {
        let from_snapshot = match snapshot::read_snapshot(snapshot_path).await {
            Ok(employees) => {
                let count = employees.len();
                registry.replace_all(employees).map(|()| count).map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };

        let source = match from_snapshot {
            Ok(count) => {
                tracing::info!(
                    employees = count,
                    path = %snapshot_path.display(),
                    "Registry loaded from snapshot"
                );
                BootstrapSource::Snapshot
            }
            Err(error) => {
                tracing::warn!(
                    path = %snapshot_path.display(),
                    %error,
                    "Snapshot unavailable, loading registry from database"
                );
                let employees = store.load_all_employees().await?;
                tracing::info!(employees = employees.len(), "Registry loaded from database");
                registry.replace_all(employees)?;
                handle.schedule();
                BootstrapSource::Store
            }
        };

        Ok((Self::new(registry, store, handle), source))
    }

    pub fn registry(&self) -> &EmployeeRegistry {
        &self.registry
    }

    pub fn snapshot_handle(&self) -> &SnapshotHandle {
        &self.snapshot
    }

    /// Await the snapshot write covering `ticket`
    pub async fn wait_for_snapshot(&self, ticket: SnapshotTicket) -> Result<(), SnapshotWaitError> {
        self.snapshot.wait_for(ticket).await
    }

    // ========== Authorization ==========

    /// Current, active record of `actor` with the required capability
    fn authorize(
        &self,
        actor: &Employee,
        permission: &str,
        allowed: impl Fn(Role) -> bool,
    ) -> EmployeeResult<Employee> {
        let current = self
            .registry
            .find_by_id(actor.id())
            .ok_or_else(|| EmployeeError::permission_denied(format!("unknown actor {}", actor.id())))?;

        if !current.is_active() {
            return Err(EmployeeError::permission_denied(format!(
                "{} is not active",
                current.username()
            )));
        }
        if !allowed(current.role()) {
            tracing::warn!(
                actor_id = current.id(),
                role = %current.role(),
                permission,
                "Permission denied"
            );
            return Err(EmployeeError::permission_denied(format!(
                "{} cannot {permission}",
                current.role()
            )));
        }
        Ok(current)
    }

    /// Only a Chief may change another Chief
    fn authorize_target(actor: &Employee, target: &Employee) -> EmployeeResult<()> {
        if target.role() == Role::Chief && !actor.role().can_assign_chief() {
            return Err(EmployeeError::permission_denied(format!(
                "{} cannot modify a Chief",
                actor.role()
            )));
        }
        Ok(())
    }

    fn target(&self, id: i64) -> EmployeeResult<Employee> {
        self.registry
            .find_by_id(id)
            .ok_or_else(|| EmployeeError::missing(format!("employee {id}")))
    }

    // ========== Registration ==========

    /// Register a plain employee
    pub async fn register(&self, actor: &Employee, data: &EmployeeCreate) -> EmployeeResult<Employee> {
        self.register_with_role(actor, data, Role::Employee).await
    }

    /// Register an employee with a given role.
    ///
    /// Administrators need the promote capability, Chiefs the assign-chief one.
    pub async fn register_with_role(
        &self,
        actor: &Employee,
        data: &EmployeeCreate,
        role: Role,
    ) -> EmployeeResult<Employee> {
        let _gate = self.mutations.lock().await;

        let actor = self.authorize(actor, "register employees", |r| r.can_register_employees())?;
        match role {
            Role::Employee => {}
            Role::Administrator => {
                self.authorize(&actor, "register administrators", |r| r.can_promote())?;
            }
            Role::Chief => {
                self.authorize(&actor, "register chiefs", |r| r.can_assign_chief())?;
            }
        }

        let employee = self.insert(data, role).await?;
        tracing::info!(
            employee_id = employee.id(),
            username = %employee.username(),
            role = %employee.role(),
            actor_id = actor.id(),
            "Employee registered"
        );
        Ok(employee)
    }

    /// Create the first Chief when the directory is empty.
    ///
    /// Returns `None` when employees already exist.
    pub async fn ensure_chief(&self, data: &EmployeeCreate) -> EmployeeResult<Option<Employee>> {
        let _gate = self.mutations.lock().await;

        let Some(chief) = self.registry.reserve_first(data, Role::Chief)? else {
            return Ok(None);
        };
        self.commit_insert(chief).await.map(Some)
    }

    async fn insert(&self, data: &EmployeeCreate, role: Role) -> EmployeeResult<Employee> {
        let employee = self.registry.reserve(data, role)?;
        self.commit_insert(employee).await
    }

    /// Store write for a reserved employee; the registry only sees it once the
    /// store has accepted it.
    async fn commit_insert(&self, employee: Employee) -> EmployeeResult<Employee> {
        if let Err(e) = self.store.insert_employee(&employee).await {
            tracing::error!(
                employee_id = employee.id(),
                error = %e,
                "Failed to persist new employee, reservation dropped"
            );
            return Err(e.into());
        }
        self.registry.publish(employee.clone())?;
        self.snapshot.schedule();
        Ok(employee)
    }

    // ========== Authentication ==========

    /// First matching employee in registry order
    pub fn authenticate(&self, username: &str, password: &str) -> EmployeeResult<Employee> {
        match self.registry.authenticate(username, password) {
            Ok(employee) => {
                tracing::info!(employee_id = employee.id(), username = %employee.username(), "Login succeeded");
                Ok(employee)
            }
            Err(e) => {
                crate::security_log!("WARN", "login_failed", username = username);
                Err(e)
            }
        }
    }

    // ========== Password ==========

    /// Validate and store a new password for `id`
    pub async fn change_password(&self, id: i64, new_password: &str) -> EmployeeResult<SnapshotTicket> {
        validate_password(new_password)?;
        let _gate = self.mutations.lock().await;

        let mut employee = self.target(id)?;
        employee.set_password(new_password)?;
        self.persist_password_change_locked(&employee).await
    }

    /// Write `employee`'s password to the store, mirror it in the registry and
    /// schedule a snapshot.
    ///
    /// Returns once the store write is acknowledged; the snapshot write happens
    /// later. Await the returned ticket to observe it.
    pub async fn persist_password_change(&self, employee: &Employee) -> EmployeeResult<SnapshotTicket> {
        let _gate = self.mutations.lock().await;
        self.persist_password_change_locked(employee).await
    }

    async fn persist_password_change_locked(&self, employee: &Employee) -> EmployeeResult<SnapshotTicket> {
        self.store
            .update_password(employee.id(), employee.password())
            .await?;
        let password = employee.password().to_string();
        self.registry
            .update(employee.id(), |e| e.set_password(&password))?;

        tracing::info!(employee_id = employee.id(), "Password changed");
        Ok(self.snapshot.schedule())
    }

    // ========== Role transitions ==========

    /// Toggle Employee/Administrator (a Chief becomes Administrator).
    pub async fn promote(&self, actor: &Employee, id: i64) -> EmployeeResult<Employee> {
        let _gate = self.mutations.lock().await;

        let actor = self.authorize(actor, "promote employees", |r| r.can_promote())?;
        let current = self.target(id)?;
        Self::authorize_target(&actor, &current)?;

        let promoted = current.with_swapped_role();
        self.commit_role(&promoted).await?;
        tracing::info!(
            employee_id = id,
            from = %current.role(),
            to = %promoted.role(),
            actor_id = actor.id(),
            "Role changed"
        );
        Ok(promoted)
    }

    /// Make `id` an active Chief. Existing Chiefs keep their role.
    pub async fn assign_chief(&self, actor: &Employee, id: i64) -> EmployeeResult<Employee> {
        let _gate = self.mutations.lock().await;

        let actor = self.authorize(actor, "assign chiefs", |r| r.can_assign_chief())?;
        let chief = self.target(id)?.as_chief();
        self.commit_role(&chief).await?;
        tracing::info!(employee_id = id, actor_id = actor.id(), "Chief assigned");
        Ok(chief)
    }

    async fn commit_role(&self, employee: &Employee) -> EmployeeResult<()> {
        self.store
            .update_role(employee.id(), employee.role(), employee.is_active())
            .await?;
        self.registry.replace(employee.clone())?;
        self.snapshot.schedule();
        Ok(())
    }

    // ========== Management ==========

    pub async fn set_salary(&self, actor: &Employee, id: i64, salary: f64) -> EmployeeResult<Employee> {
        let _gate = self.mutations.lock().await;

        let actor = self.authorize(actor, "manage employees", |r| r.can_manage_employees())?;
        let mut employee = self.target(id)?;
        Self::authorize_target(&actor, &employee)?;
        employee.set_salary(salary)?;

        self.store.update_salary(id, salary).await?;
        self.registry.update(id, |e| e.set_salary(salary))?;
        self.snapshot.schedule();
        tracing::info!(employee_id = id, salary, actor_id = actor.id(), "Salary changed");
        Ok(employee)
    }

    /// Soft delete
    pub async fn deactivate(&self, actor: &Employee, id: i64) -> EmployeeResult<Employee> {
        self.set_active(actor, id, false).await
    }

    pub async fn reactivate(&self, actor: &Employee, id: i64) -> EmployeeResult<Employee> {
        self.set_active(actor, id, true).await
    }

    async fn set_active(&self, actor: &Employee, id: i64, is_active: bool) -> EmployeeResult<Employee> {
        let _gate = self.mutations.lock().await;

        let actor = self.authorize(actor, "manage employees", |r| r.can_manage_employees())?;
        let mut employee = self.target(id)?;
        Self::authorize_target(&actor, &employee)?;
        employee.set_active(is_active);

        self.store.set_active(id, is_active).await?;
        self.registry.update(id, |e| {
            e.set_active(is_active);
            Ok(())
        })?;
        self.snapshot.schedule();
        tracing::info!(employee_id = id, is_active, actor_id = actor.id(), "Active flag changed");
        Ok(employee)
    }

    // ========== Snapshot & reports ==========

    /// Explicit snapshot trigger
    pub fn save_snapshot(&self, actor: &Employee) -> EmployeeResult<SnapshotTicket> {
        self.authorize(actor, "save snapshots", |r| r.can_save_snapshot())?;
        Ok(self.snapshot.schedule())
    }

    /// `describe()` text for one employee against `purchases`
    pub fn employee_report<S>(&self, id: i64, purchases: &S) -> EmployeeResult<String>
    where
        S: PurchaseSource + ?Sized,
    {
        Ok(self.target(id)?.describe(purchases))
    }
}
