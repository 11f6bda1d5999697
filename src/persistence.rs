// src/persistence.rs - Background persistence writer
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, info, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use crate::{MemoraError, PersistedState, Result, StateFile, StateSink};

#[derive(Debug, Clone, Default)]
pub struct PersistenceStatus {
    /// Snapshots actually written to disk
    pub writes: u64,
    /// Snapshots received, including ones superseded before being written
    pub received: u64,
    /// The time of the last successful write
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Error from the last write, cleared by the next successful one
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub enum PersistCommand {
    /// Queue a snapshot, replacing any queued one
    Save(PersistedState),
    /// Write whatever is queued now and report the outcome
    Flush(oneshot::Sender<Result<()>>),
    /// Write whatever is queued and stop
    Stop,
}

/// Cheap handle the store writes through. Sends never block.
#[derive(Debug, Clone)]
pub struct PersistenceHandle {
    command_tx: mpsc::UnboundedSender<PersistCommand>,
    status: Arc<Mutex<PersistenceStatus>>,
    path: PathBuf,
}

/// Owns the writer task
pub struct PersistenceWorker {
    handle: PersistenceHandle,
    task: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    /// Spawns the writer on the current tokio runtime. Snapshots arriving
    /// within `debounce` of the first queued one are coalesced into one write.
    pub fn spawn(file: StateFile, debounce: Duration) -> (Self, PersistenceHandle) {
        info!(
            "Starting persistence writer for {} (debounce {:?})",
            file.path().display(),
            debounce
        );
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(PersistenceStatus::default()));
        let handle = PersistenceHandle {
            command_tx,
            status: Arc::clone(&status),
            path: file.path().to_path_buf(),
        };

        let task = tokio::spawn(run_writer(file, command_rx, status, debounce));

        (
            Self {
                handle: handle.clone(),
                task: Some(task),
            },
            handle,
        )
    }

    pub fn handle(&self) -> PersistenceHandle {
        self.handle.clone()
    }

    /// Writes anything still queued and waits for the task to finish
    pub async fn shutdown(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            debug!("Persistence writer is not running");
            return Ok(());
        };

        if let Err(e) = self.handle.command_tx.send(PersistCommand::Stop) {
            error!("Failed to send stop command to persistence writer: {}", e);
        }

        if let Err(e) = task.await {
            let message = format!("Persistence writer did not stop cleanly: {}", e);
            error!("{}", message);
            return Err(MemoraError::ApplicationError { message });
        }

        info!("Persistence writer stopped");
        match self.handle.status().last_error {
            Some(message) => Err(MemoraError::PersistenceFailure {
                path: self.handle.path.clone(),
                message,
            }),
            None => Ok(()),
        }
    }
}

impl PersistenceHandle {
    pub fn status(&self) -> PersistenceStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Waits until every snapshot handed over so far is on disk
    pub async fn flush(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(PersistCommand::Flush(reply_tx))
            .map_err(|_| self.stopped())?;
        reply_rx.await.map_err(|_| self.stopped())?
    }

    fn stopped(&self) -> MemoraError {
        MemoraError::PersistenceFailure {
            path: self.path.clone(),
            message: "persistence writer is not running".to_string(),
        }
    }
}

impl StateSink for PersistenceHandle {
    fn persist(&self, state: &PersistedState) -> Result<()> {
        self.command_tx
            .send(PersistCommand::Save(state.clone()))
            .map_err(|_| self.stopped())
    }

    fn last_failure(&self) -> Option<String> {
        self.status().last_error
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

async fn run_writer(
    file: StateFile,
    mut command_rx: mpsc::UnboundedReceiver<PersistCommand>,
    status: Arc<Mutex<PersistenceStatus>>,
    debounce: Duration,
) {
    let mut pending: Option<PersistedState> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(at) => {
                tokio::select! {
                    command = command_rx.recv() => command,
                    _ = time::sleep_until(at) => {
                        let _ = write_pending(&file, &mut pending, &status);
                        deadline = None;
                        continue;
                    }
                }
            }
            None => command_rx.recv().await,
        };

        match command {
            Some(PersistCommand::Save(state)) => {
                trace!("Queued snapshot with {} notes", state.notes.len());
                if let Ok(mut status) = status.lock() {
                    status.received += 1;
                }
                pending = Some(state);
                deadline.get_or_insert_with(|| Instant::now() + debounce);
            }
            Some(PersistCommand::Flush(reply)) => {
                let result = write_pending(&file, &mut pending, &status);
                deadline = None;
                let _ = reply.send(result);
            }
            Some(PersistCommand::Stop) | None => {
                let _ = write_pending(&file, &mut pending, &status);
                debug!("Persistence writer exiting");
                break;
            }
        }
    }
}

fn write_pending(
    file: &StateFile,
    pending: &mut Option<PersistedState>,
    status: &Mutex<PersistenceStatus>,
) -> Result<()> {
    let Some(state) = pending.take() else {
        return Ok(());
    };

    let result = file.save(&state);
    if let Ok(mut status) = status.lock() {
        match &result {
            Ok(()) => {
                status.writes += 1;
                status.last_saved_at = Some(Utc::now());
                status.last_error = None;
            }
            Err(e) => {
                error!("Background write failed: {}", e);
                status.last_error = Some(e.to_string());
            }
        }
    }
    result
}
