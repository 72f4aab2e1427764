use shared::models::EmployeeCreate;
use std::path::PathBuf;

/// Runtime configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | working directory |
/// | DATABASE_PATH | {WORK_DIR}/database/staff.db | SQLite file |
/// | SNAPSHOT_PATH | {WORK_DIR}/snapshot/employees.json | snapshot file |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_DIR | (none) | rolling log directory |
/// | LOG_JSON | false | JSON console output |
/// | ENVIRONMENT | development | development, staging or production |
/// | SNAPSHOT_CHANNEL_CAPACITY | 64 | queued snapshot wake-ups |
/// | BOOTSTRAP_CHIEF_NAME / _SURNAME / _NATIONAL_ID / _SALARY / _USERNAME | (none) | first Chief account |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/staff LOG_LEVEL=debug cargo run -p staff-directory
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub database_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    /// development, staging or production
    pub environment: String,
    pub snapshot_channel_capacity: usize,
    /// Chief created when the directory starts empty
    pub bootstrap_chief: Option<EmployeeCreate>,
}

impl Config {
    /// Read every setting from the environment, falling back to the defaults above
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let root = PathBuf::from(&work_dir);

        Self {
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root.join("database").join("staff.db")),
            snapshot_path: std::env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root.join("snapshot").join("employees.json")),
            work_dir,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            snapshot_channel_capacity: std::env::var("SNAPSHOT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
            bootstrap_chief: bootstrap_chief_from_env(),
        }
    }

    /// Explicit paths, everything else at its default. Ignores the environment.
    pub fn with_paths(database_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: ".".into(),
            database_path: database_path.into(),
            snapshot_path: snapshot_path.into(),
            log_level: "info".into(),
            log_dir: None,
            log_json: false,
            environment: "development".into(),
            snapshot_channel_capacity: 64,
            bootstrap_chief: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// All five variables must be present; a malformed number disables bootstrap.
fn bootstrap_chief_from_env() -> Option<EmployeeCreate> {
    let var = |suffix: &str| std::env::var(format!("BOOTSTRAP_CHIEF_{suffix}")).ok();

    let name = var("NAME")?;
    let surname = var("SURNAME")?;
    let national_id: i64 = var("NATIONAL_ID")?.trim().parse().ok()?;
    let salary: f64 = var("SALARY")?.trim().parse().ok()?;
    let username = var("USERNAME")?;

    Some(EmployeeCreate::new(name, surname, national_id, salary, username))
}
