//! End-to-end flows through `StaffDirectory` with an in-memory SQLite store
//! and a real snapshot worker.

use async_trait::async_trait;
use shared::error::{DataViolation, EmployeeError};
use shared::models::{Employee, EmployeeCreate, Purchase, PurchaseLedger, Role};
use staff_directory::db::repository::RepoResult;
use staff_directory::snapshot::read_snapshot;
use staff_directory::{
    BootstrapSource, DbService, EmployeeRegistry, EmployeeStore, RepoError, SnapshotWaitError,
    SnapshotWorker, SqliteEmployeeStore, StaffDirectory,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Harness {
    _dir: TempDir,
    directory: StaffDirectory,
    store: Arc<SqliteEmployeeStore>,
    snapshot_path: PathBuf,
    chief: Employee,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("snapshot").join("employees.json");
        Self::with_snapshot_at(dir, snapshot_path).await
    }

    async fn with_snapshot_at(dir: TempDir, snapshot_path: PathBuf) -> Self {
        let db = DbService::in_memory().await.unwrap();
        let store = Arc::new(SqliteEmployeeStore::new(db.pool.clone()));

        let registry = Arc::new(EmployeeRegistry::new());
        let (worker, handle) = SnapshotWorker::new(&snapshot_path, registry.clone(), 8);
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(worker.run(shutdown.clone()));

        let (directory, source) =
            StaffDirectory::bootstrap(registry, store.clone(), &snapshot_path, handle)
                .await
                .unwrap();
        assert_eq!(source, BootstrapSource::Store);

        let chief = directory
            .ensure_chief(&EmployeeCreate::new("Carla", "Jefa", 20111000, 5000.0, "carla"))
            .await
            .unwrap()
            .unwrap();

        Self {
            _dir: dir,
            directory,
            store,
            snapshot_path,
            chief,
            shutdown,
            worker,
        }
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.worker.await.unwrap();
    }
}

fn ana() -> EmployeeCreate {
    EmployeeCreate::new("Ana", "Lopez", 30111222, 1500.0, "anal")
}

fn bruno() -> EmployeeCreate {
    EmployeeCreate::new("Bruno", "Diaz", 28999111, 1200.0, "bruno")
}

fn usernames(employees: &[Employee]) -> Vec<String> {
    employees.iter().map(|e| e.username().to_string()).collect()
}

#[tokio::test]
async fn create_then_authenticate_with_default_password() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let logged_in = h.directory.authenticate("ANAL", "30111222").unwrap();
    assert_eq!(logged_in.id(), ana.id());

    // Password comparison is case-sensitive, username comparison is not
    assert_eq!(
        h.directory.authenticate("anal", "30111222x").unwrap_err(),
        EmployeeError::AuthenticationFailure
    );
    assert_eq!(
        h.directory.authenticate("nobody", "30111222").unwrap_err(),
        EmployeeError::AuthenticationFailure
    );

    h.stop().await;
}

#[tokio::test]
async fn invalid_username_is_rejected() {
    let h = Harness::new().await;

    let mut data = ana();
    data.username = "a.b".into();
    let err = h.directory.register(&h.chief, &data).await.unwrap_err();
    assert!(err.is_invalid_data());
    assert_eq!(h.directory.registry().count(), 1);
    assert_eq!(h.store.load_all_employees().await.unwrap().len(), 1);

    h.stop().await;
}

#[tokio::test]
async fn duplicate_national_id_is_rejected() {
    let h = Harness::new().await;

    h.directory.register(&h.chief, &ana()).await.unwrap();
    let other = EmployeeCreate::new("Otra", "Persona", 30111222, 900.0, "otra");
    let err = h.directory.register(&h.chief, &other).await.unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&DataViolation::DuplicateNationalId(30111222))
    );

    h.stop().await;
}

#[tokio::test]
async fn duplicate_username_is_rejected_whatever_the_other_fields() {
    let h = Harness::new().await;

    h.directory.register(&h.chief, &ana()).await.unwrap();
    h.directory.register(&h.chief, &bruno()).await.unwrap();
    assert!(h.directory.registry().exists_username("ANAL"));
    assert!(h.directory.registry().exists_username("Bruno"));

    let clash = EmployeeCreate::new("Zoe", "Zeta", 45000111, 3000.0, "BRUNO");
    let err = h.directory.register(&h.chief, &clash).await.unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&DataViolation::DuplicateUsername("Bruno".into()))
    );

    h.stop().await;
}

#[tokio::test]
async fn promotion_preserves_identity_and_is_persisted() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let admin = h.directory.promote(&h.chief, ana.id()).await.unwrap();

    assert_eq!(admin.role(), Role::Administrator);
    assert_eq!(admin.id(), ana.id());
    assert_eq!(admin.national_id(), ana.national_id());
    assert_eq!(admin.username(), ana.username());
    assert_eq!(admin.password(), ana.password());
    assert_eq!(admin.salary(), ana.salary());

    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.role(), Role::Administrator);
    assert_eq!(
        h.directory.registry().find_by_id(ana.id()).unwrap().role(),
        Role::Administrator
    );

    // Toggling again demotes
    let back = h.directory.promote(&h.chief, ana.id()).await.unwrap();
    assert_eq!(back.role(), Role::Employee);

    h.stop().await;
}

#[tokio::test]
async fn promoting_unknown_id_is_missing_value() {
    let h = Harness::new().await;

    let err = h.directory.promote(&h.chief, 999).await.unwrap_err();
    assert!(matches!(err, EmployeeError::MissingRequiredValue(_)));

    h.stop().await;
}

#[tokio::test]
async fn assign_chief_reactivates() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    h.directory.deactivate(&h.chief, ana.id()).await.unwrap();

    let chief = h.directory.assign_chief(&h.chief, ana.id()).await.unwrap();
    assert_eq!(chief.role(), Role::Chief);
    assert!(chief.is_active());

    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.role(), Role::Chief);
    assert!(stored.is_active());

    // The original Chief keeps the role
    assert_eq!(
        h.directory.registry().find_by_id(h.chief.id()).unwrap().role(),
        Role::Chief
    );

    h.stop().await;
}

#[tokio::test]
async fn capabilities_are_enforced() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let err = h.directory.register(&ana, &bruno()).await.unwrap_err();
    assert!(matches!(err, EmployeeError::PermissionDenied(_)));
    assert!(h.directory.save_snapshot(&ana).is_err());

    let admin = h.directory.promote(&h.chief, ana.id()).await.unwrap();
    let bruno = h.directory.register(&admin, &bruno()).await.unwrap();

    // Administrators cannot create or touch Chiefs
    let err = h.directory.assign_chief(&admin, bruno.id()).await.unwrap_err();
    assert!(matches!(err, EmployeeError::PermissionDenied(_)));
    let err = h
        .directory
        .set_salary(&admin, h.chief.id(), 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EmployeeError::PermissionDenied(_)));

    // A deactivated administrator loses its capabilities
    h.directory.deactivate(&h.chief, admin.id()).await.unwrap();
    let err = h.directory.save_snapshot(&admin).unwrap_err();
    assert!(matches!(err, EmployeeError::PermissionDenied(_)));

    h.stop().await;
}

#[tokio::test]
async fn salary_changes_are_validated_and_persisted() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let err = h
        .directory
        .set_salary(&h.chief, ana.id(), 0.0)
        .await
        .unwrap_err();
    assert_eq!(err.violation(), Some(&DataViolation::NonPositiveSalary(0.0)));

    h.directory
        .set_salary(&h.chief, ana.id(), 1750.0)
        .await
        .unwrap();
    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.salary(), 1750.0);

    h.stop().await;
}

#[tokio::test]
async fn password_change_reaches_store_now_and_snapshot_eventually() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let ticket = h.directory.change_password(ana.id(), "Nueva1").await.unwrap();

    // Store is authoritative as soon as the call returns
    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.password(), "Nueva1");
    assert!(h.directory.authenticate("anal", "Nueva1").is_ok());
    assert!(h.directory.authenticate("anal", "30111222").is_err());

    // Snapshot only after the background write
    h.directory.wait_for_snapshot(ticket).await.unwrap();
    let on_disk = read_snapshot(&h.snapshot_path).await.unwrap();
    let snap_ana = on_disk.iter().find(|e| e.id() == ana.id()).unwrap();
    assert_eq!(snap_ana.password(), "Nueva1");

    h.stop().await;
}

#[tokio::test]
async fn password_change_commits_even_when_snapshot_write_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"occupied").unwrap();
    let h = Harness::with_snapshot_at(dir, blocker.join("employees.json")).await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let ticket = h.directory.change_password(ana.id(), "Nueva1").await.unwrap();

    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.password(), "Nueva1");
    assert!(h.directory.authenticate("anal", "Nueva1").is_ok());

    let err = h.directory.wait_for_snapshot(ticket).await.unwrap_err();
    assert!(matches!(err, SnapshotWaitError::Failed(_)));

    h.stop().await;
}

#[tokio::test]
async fn persist_password_change_writes_store_registry_and_snapshot() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let mut changed = ana.clone();
    changed.set_password("Clave9").unwrap();

    let ticket = h.directory.persist_password_change(&changed).await.unwrap();
    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.password(), "Clave9");
    assert_eq!(
        h.directory.registry().find_by_id(ana.id()).unwrap().password(),
        "Clave9"
    );

    h.directory.wait_for_snapshot(ticket).await.unwrap();
    let on_disk = read_snapshot(&h.snapshot_path).await.unwrap();
    let snap_ana = on_disk.iter().find(|e| e.id() == ana.id()).unwrap();
    assert_eq!(snap_ana.password(), "Clave9");

    // Unknown ids are rejected by the store and leave the registry alone
    let mut record = changed.to_record();
    record.id = 999;
    let stranger = Employee::reconstruct(record).unwrap();
    let err = h.directory.persist_password_change(&stranger).await.unwrap_err();
    assert!(matches!(err, EmployeeError::Persistence(_)));
    assert!(h.directory.registry().find_by_id(999).is_none());

    h.stop().await;
}

#[tokio::test]
async fn invalid_new_password_changes_nothing() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let err = h
        .directory
        .change_password(ana.id(), "a b1")
        .await
        .unwrap_err();
    assert_eq!(err.violation(), Some(&DataViolation::PasswordCharset));

    let stored = h.store.find_by_id(ana.id()).await.unwrap().unwrap();
    assert_eq!(stored.password(), "30111222");

    h.stop().await;
}

#[tokio::test]
async fn restart_loads_registry_from_snapshot() {
    let h = Harness::new().await;

    h.directory.register(&h.chief, &ana()).await.unwrap();
    h.directory.register(&h.chief, &bruno()).await.unwrap();
    let ticket = h.directory.save_snapshot(&h.chief).unwrap();
    h.directory.wait_for_snapshot(ticket).await.unwrap();
    let before = h.directory.registry().employees();

    // Second process over the same files
    let registry = Arc::new(EmployeeRegistry::new());
    let (worker, handle) = SnapshotWorker::new(&h.snapshot_path, registry.clone(), 8);
    drop(worker);
    let (restarted, source) =
        StaffDirectory::bootstrap(registry, h.store.clone(), &h.snapshot_path, handle)
            .await
            .unwrap();

    assert_eq!(source, BootstrapSource::Snapshot);
    assert_eq!(restarted.registry().employees(), before);
    assert_eq!(restarted.registry().next_id(), 4);
    assert!(restarted.authenticate("bruno", "28999111").is_ok());

    h.stop().await;
}

#[tokio::test]
async fn ensure_chief_only_on_empty_directory() {
    let h = Harness::new().await;

    let again = h.directory.ensure_chief(&ana()).await.unwrap();
    assert!(again.is_none());
    assert_eq!(h.directory.registry().count(), 1);
    assert_eq!(h.chief.role(), Role::Chief);

    h.stop().await;
}

#[tokio::test]
async fn employee_report_includes_sales() {
    let h = Harness::new().await;

    let ana = h.directory.register(&h.chief, &ana()).await.unwrap();
    let ledger: PurchaseLedger = [
        Purchase::new(ana.id(), 200.0),
        Purchase::new(h.chief.id(), 50.0),
        Purchase::new(ana.id(), 100.0),
    ]
    .into_iter()
    .collect();

    assert_eq!(ana.sales_count(&ledger), 2);
    assert_eq!(ana.average_earnings(&ledger), 150.0);

    let report = h.directory.employee_report(ana.id(), &ledger).unwrap();
    assert!(report.contains("Sales: 2"));
    assert!(report.contains("Average earnings: $150.00"));

    let empty = PurchaseLedger::new();
    let report = h.directory.employee_report(ana.id(), &empty).unwrap();
    assert!(report.contains("Average earnings: $0.00"));

    h.stop().await;
}

/// Store whose inserts always fail
struct FailingStore;

#[async_trait]
impl EmployeeStore for FailingStore {
    async fn insert_employee(&self, _employee: &Employee) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn update_password(&self, _id: i64, _password: &str) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn update_role(&self, _id: i64, _role: Role, _is_active: bool) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn update_salary(&self, _id: i64, _salary: f64) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn set_active(&self, _id: i64, _is_active: bool) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn load_all_employees(&self) -> RepoResult<Vec<Employee>> {
        Ok(Vec::new())
    }
}

fn seeded_registry() -> (Arc<EmployeeRegistry>, Employee) {
    let seed = EmployeeRegistry::new();
    let chief = seed
        .create(
            &EmployeeCreate::new("Carla", "Jefa", 20111000, 5000.0, "carla"),
            Role::Chief,
        )
        .unwrap();
    let registry = Arc::new(EmployeeRegistry::with_employees(seed.employees()).unwrap());
    (registry, chief)
}

#[tokio::test]
async fn failed_store_write_leaves_registry_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("employees.json");

    // Registry seeded with a Chief; every store write fails
    let (registry, chief) = seeded_registry();

    let (worker, handle) = SnapshotWorker::new(&path, registry.clone(), 8);
    drop(worker);
    let directory = StaffDirectory::new(registry.clone(), Arc::new(FailingStore), handle);

    let err = directory.register(&chief, &ana()).await.unwrap_err();
    assert!(matches!(err, EmployeeError::Persistence(_)));
    assert_eq!(registry.count(), 1);
    assert!(!registry.exists_username("anal"));
    // The abandoned reservation keeps its id
    assert_eq!(registry.next_id(), 3);

    let err = directory
        .change_password(chief.id(), "Nueva1")
        .await
        .unwrap_err();
    assert!(matches!(err, EmployeeError::Persistence(_)));
    assert_eq!(registry.find_by_id(chief.id()).unwrap().password(), "20111000");
}

/// Store whose inserts park until released, then fail
#[derive(Default)]
struct StallingStore {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl EmployeeStore for StallingStore {
    async fn insert_employee(&self, _employee: &Employee) -> RepoResult<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(RepoError::Database("disk full".into()))
    }

    async fn update_password(&self, _id: i64, _password: &str) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn update_role(&self, _id: i64, _role: Role, _is_active: bool) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn update_salary(&self, _id: i64, _salary: f64) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn set_active(&self, _id: i64, _is_active: bool) -> RepoResult<()> {
        Err(RepoError::Database("disk full".into()))
    }

    async fn load_all_employees(&self) -> RepoResult<Vec<Employee>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn snapshot_taken_during_pending_insert_never_holds_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("employees.json");
    let (registry, chief) = seeded_registry();

    let (worker, handle) = SnapshotWorker::new(&path, registry.clone(), 8);
    let shutdown = CancellationToken::new();
    let worker = tokio::spawn(worker.run(shutdown.clone()));

    let store = Arc::new(StallingStore::default());
    let directory = StaffDirectory::new(registry.clone(), store.clone(), handle);

    let pending = tokio::spawn({
        let directory = directory.clone();
        let chief = chief.clone();
        async move { directory.register(&chief, &ana()).await }
    });

    // Insert is parked inside the store
    store.entered.notified().await;
    assert!(!registry.exists_username("anal"));
    let ticket = directory.save_snapshot(&chief).unwrap();
    directory.wait_for_snapshot(ticket).await.unwrap();
    assert_eq!(usernames(&read_snapshot(&path).await.unwrap()), ["Carla"]);

    store.release.notify_one();
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, EmployeeError::Persistence(_)));

    shutdown.cancel();
    worker.await.unwrap();
    assert_eq!(usernames(&registry.employees()), ["Carla"]);
    assert_eq!(usernames(&read_snapshot(&path).await.unwrap()), ["Carla"]);
}
