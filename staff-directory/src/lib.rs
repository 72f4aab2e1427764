//! Staff Directory - employee records and authentication for a design studio
//!
//! # Layout
//!
//! - **registry**: the in-process employee collection; uniqueness and login
//! - **db**: SQLite store, the system of record
//! - **snapshot**: JSON snapshot file and the worker that writes it
//! - **service**: `StaffDirectory`, which ties the three together
//!
//! ```text
//! staff-directory/src/
//! ├── core/          # config, runtime state, background tasks
//! ├── db/            # pool and employee repository
//! ├── registry/
//! ├── snapshot/
//! ├── service.rs
//! └── utils/         # logging
//! ```

pub mod core;
pub mod db;
pub mod registry;
pub mod service;
pub mod snapshot;
pub mod utils;

// Re-exports
pub use crate::core::{BackgroundTasks, Config, DirectoryState, TaskKind};
pub use db::DbService;
pub use db::repository::{EmployeeStore, RepoError, SqliteEmployeeStore};
pub use registry::EmployeeRegistry;
pub use service::{BootstrapSource, StaffDirectory};
pub use snapshot::{SnapshotError, SnapshotHandle, SnapshotTicket, SnapshotWaitError, SnapshotWorker};

pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Writes to the "security" target, which the logger routes to its own file
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Create the work dir and install the logger
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(
        &config.log_level,
        config.log_json || config.is_production(),
        config.log_dir.as_deref(),
    )?;
    Ok(())
}

/// Prune old application logs once a day until `shutdown` fires
pub async fn run_log_cleanup(
    log_dir: std::path::PathBuf,
    shutdown: tokio_util::sync::CancellationToken,
) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = cleanup_old_logs(&log_dir, utils::logger::APP_LOG_RETENTION_DAYS) {
                    tracing::warn!(error = %e, "Log cleanup failed");
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }
}

pub fn print_banner() {
    println!(
        r#"
  ___ _         __  __
 / __| |_ __ _ / _|/ _|
 \__ \  _/ _` |  _|  _|
 |___/\__\__,_|_| |_|   directory v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
