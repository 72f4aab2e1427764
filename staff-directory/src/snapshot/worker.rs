//! Snapshot background worker
//!
//! Consumes wake-ups from an mpsc channel and rewrites the snapshot file from
//! the registry's current contents. Requests that pile up while a write is in
//! flight collapse into a single write, because every write reads the newest
//! state anyway.
//!
//! Each [`SnapshotHandle::schedule`] returns a [`SnapshotTicket`]; callers that
//! care (tests, shutdown) can await it with [`SnapshotHandle::wait_for`].
//! Callers that don't are never blocked by the write.

use super::write_snapshot;
use crate::registry::EmployeeRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generation number of a scheduled snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTicket(u64);

impl SnapshotTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotWaitError {
    /// The write covering the ticket failed (the error was logged by the worker)
    #[error("Snapshot write for generation {0} failed")]
    Failed(u64),

    #[error("Snapshot worker stopped before the ticket was processed")]
    WorkerStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    /// Highest generation covered by a write attempt
    processed: u64,
    last_ok: bool,
}

/// Cloneable scheduling side of the worker
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    tx: mpsc::Sender<()>,
    issued: Arc<AtomicU64>,
    progress: watch::Receiver<Progress>,
}

impl SnapshotHandle {
    /// Ask for a fresh snapshot. Never waits for the write.
    ///
    /// Must be called after the registry mutation it should capture.
    pub fn schedule(&self) -> SnapshotTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        match self.tx.try_send(()) {
            // A queued wake-up reads the registry later than now, so it covers us
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => {
                tracing::warn!(generation, "Snapshot worker stopped, request dropped");
            }
        }
        SnapshotTicket(generation)
    }

    /// Most recently issued ticket
    pub fn latest(&self) -> SnapshotTicket {
        SnapshotTicket(self.issued.load(Ordering::SeqCst))
    }

    /// Wait until a write covering `ticket` has been attempted
    pub async fn wait_for(&self, ticket: SnapshotTicket) -> Result<(), SnapshotWaitError> {
        let mut rx = self.progress.clone();
        let progress = *rx
            .wait_for(|p| p.processed >= ticket.0)
            .await
            .map_err(|_| SnapshotWaitError::WorkerStopped)?;
        if progress.last_ok {
            Ok(())
        } else {
            Err(SnapshotWaitError::Failed(progress.processed))
        }
    }
}

/// Snapshot background worker
pub struct SnapshotWorker {
    path: PathBuf,
    registry: Arc<EmployeeRegistry>,
    rx: mpsc::Receiver<()>,
    issued: Arc<AtomicU64>,
    progress: watch::Sender<Progress>,
}

impl SnapshotWorker {
    /// Build the worker and its handle. `capacity` bounds queued wake-ups.
    pub fn new(
        path: impl Into<PathBuf>,
        registry: Arc<EmployeeRegistry>,
        capacity: usize,
    ) -> (Self, SnapshotHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (progress_tx, progress_rx) = watch::channel(Progress {
            processed: 0,
            last_ok: true,
        });
        let issued = Arc::new(AtomicU64::new(0));

        let worker = Self {
            path: path.into(),
            registry,
            rx,
            issued: issued.clone(),
            progress: progress_tx,
        };
        let handle = SnapshotHandle {
            tx,
            issued,
            progress: progress_rx,
        };
        (worker, handle)
    }

    /// Run until the channel closes or `shutdown` fires.
    ///
    /// On shutdown any outstanding request is written before returning.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(path = %self.path.display(), "Snapshot worker started");

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(()) => {
                        self.drain();
                        self.write_current().await;
                    }
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    self.drain();
                    self.write_current().await;
                    break;
                }
            }
        }

        tracing::info!("Snapshot channel closed, worker stopping");
    }

    fn drain(&mut self) {
        let mut coalesced = 0usize;
        while self.rx.try_recv().is_ok() {
            coalesced += 1;
        }
        if coalesced > 0 {
            tracing::debug!(coalesced, "Coalesced queued snapshot requests");
        }
    }

    async fn write_current(&mut self) {
        // Load the generation before reading the registry: every ticket up to
        // here was issued after its mutation, so the read below includes it.
        let generation = self.issued.load(Ordering::SeqCst);
        let current = *self.progress.borrow();
        if generation <= current.processed && current.last_ok {
            return;
        }

        let employees = self.registry.employees();
        let count = employees.len();
        let last_ok = match write_snapshot(&self.path, employees).await {
            Ok(()) => {
                tracing::debug!(
                    generation,
                    employees = count,
                    path = %self.path.display(),
                    "Snapshot written"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    generation,
                    path = %self.path.display(),
                    error = %e,
                    "Failed to write snapshot"
                );
                false
            }
        };

        self.progress.send_replace(Progress {
            processed: generation,
            last_ok,
        });
    }
}
