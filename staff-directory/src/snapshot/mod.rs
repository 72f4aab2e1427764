//! Snapshot file
//!
//! A JSON export of the whole registry, sufficient to rebuild it without the
//! relational store. Written atomically (tmp file + rename); the last writer
//! wins.

pub mod worker;

pub use worker::{SnapshotHandle, SnapshotTicket, SnapshotWaitError, SnapshotWorker};

use serde::{Deserialize, Serialize};
use shared::models::Employee;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current on-disk format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// On-disk document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub version: u32,
    /// Unix millis
    pub generated_at: i64,
    /// Registry order
    pub employees: Vec<Employee>,
}

impl SnapshotFile {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            generated_at: shared::util::now_millis(),
            employees,
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `employees` to `path`, creating parent directories as needed
pub async fn write_snapshot(path: &Path, employees: Vec<Employee>) -> Result<(), SnapshotError> {
    let bytes = serde_json::to_vec_pretty(&SnapshotFile::new(employees))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Atomic write: tmp file + rename
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Load and re-validate every employee in the snapshot at `path`
pub async fn read_snapshot(path: &Path) -> Result<Vec<Employee>, SnapshotError> {
    let bytes = tokio::fs::read(path).await?;
    let file: SnapshotFile = serde_json::from_slice(&bytes)?;
    if file.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(file.version));
    }
    Ok(file.employees)
}
