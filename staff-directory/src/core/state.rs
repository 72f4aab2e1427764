use std::sync::Arc;

use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;
use crate::db::repository::{EmployeeStore, SqliteEmployeeStore};
use crate::registry::EmployeeRegistry;
use crate::service::{BootstrapSource, StaffDirectory};
use crate::snapshot::SnapshotWorker;

/// Everything `main` keeps alive between startup and shutdown
pub struct DirectoryState {
    pub config: Config,
    pub db: DbService,
    pub directory: StaffDirectory,
    pub bootstrap_source: BootstrapSource,
}

impl DirectoryState {
    /// Open and migrate the database, spawn the snapshot worker into `tasks`,
    /// load the registry, then create the configured Chief if nobody exists yet.
    pub async fn initialize(config: Config, tasks: &mut BackgroundTasks) -> anyhow::Result<Self> {
        let db_path = config.database_path.to_string_lossy().into_owned();
        let db = DbService::new(&db_path).await?;

        let store: Arc<dyn EmployeeStore> = Arc::new(SqliteEmployeeStore::new(db.pool.clone()));
        let registry = Arc::new(EmployeeRegistry::new());

        let (worker, handle) = SnapshotWorker::new(
            config.snapshot_path.clone(),
            registry.clone(),
            config.snapshot_channel_capacity,
        );
        tasks.spawn(
            "snapshot_worker",
            TaskKind::Worker,
            worker.run(tasks.shutdown_token()),
        );

        let (directory, bootstrap_source) =
            StaffDirectory::bootstrap(registry, store, &config.snapshot_path, handle).await?;

        if let Some(data) = &config.bootstrap_chief {
            match directory.ensure_chief(data).await? {
                Some(chief) => {
                    tracing::info!(employee_id = chief.id(), username = %chief.username(), "Bootstrap Chief created");
                }
                None => tracing::debug!("Directory not empty, bootstrap Chief skipped"),
            }
        }

        tracing::info!(
            employees = directory.registry().count(),
            source = ?bootstrap_source,
            "Staff directory ready"
        );

        Ok(Self {
            config,
            db,
            directory,
            bootstrap_source,
        })
    }
}
