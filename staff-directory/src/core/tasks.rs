//! Background task bookkeeping
//!
//! Long-lived tasks share one cancellation token. A [`TaskKind::Worker`]
//! runs for the whole process (the snapshot writer); a
//! [`TaskKind::Periodic`] task wakes on a timer (log cleanup).

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Worker,
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Worker => "worker",
            TaskKind::Periodic => "periodic",
        })
    }
}

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Owns the spawned background tasks until [`shutdown`](Self::shutdown).
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// tasks.spawn("snapshot_worker", TaskKind::Worker, worker.run(tasks.shutdown_token()));
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled by [`shutdown`](Self::shutdown); hand it to the task body.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn `future` on the runtime. A panic inside it is logged, not propagated.
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if shutdown.is_cancelled() => {
                    tracing::debug!(task = name, %kind, "Background task stopped");
                }
                Ok(()) => {
                    tracing::warn!(task = name, %kind, "Background task returned before shutdown");
                }
                Err(payload) => {
                    tracing::error!(
                        task = name,
                        %kind,
                        panic = panic_message(payload.as_ref()),
                        "Background task panicked"
                    );
                }
            }
        });

        tracing::debug!(task = name, %kind, "Background task spawned");
        self.tasks.push(RegisteredTask { name, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancel the shared token and wait for every task to return.
    pub async fn shutdown(self) {
        tracing::info!(tasks = self.tasks.len(), "Stopping background tasks");
        self.shutdown.cancel();

        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::error!(task = task.name, error = ?e, "Background task join failed");
            }
        }

        tracing::info!("Background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
