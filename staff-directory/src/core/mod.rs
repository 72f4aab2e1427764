//! Configuration, startup state and background task bookkeeping

pub mod config;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use state::DirectoryState;
pub use tasks::{BackgroundTasks, TaskKind};
