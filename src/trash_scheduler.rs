// src/trash_scheduler.rs - Recurring trash cleanup
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{MemoraError, NoteStore, Result};

#[derive(Debug, Clone, Default)]
pub struct TrashSchedulerStatus {
    /// Whether the scheduler is running
    pub is_running: bool,
    /// The time the last cleanup ran
    pub last_run: Option<DateTime<Utc>>,
    /// Notes purged since the scheduler started
    pub purged_total: usize,
}

#[derive(Debug, Clone)]
pub enum TrashCommand {
    /// Run a cleanup immediately
    RunNow,
    /// Stop the scheduler
    Stop,
}

pub struct TrashScheduler {
    /// Time between cleanups
    interval: Duration,

    /// Channel to send commands to the scheduler task
    command_tx: Option<mpsc::Sender<TrashCommand>>,

    /// Handle to the scheduler task
    scheduler_task: Option<JoinHandle<()>>,

    /// Shared with the task so it can report runs
    status: Arc<std::sync::Mutex<TrashSchedulerStatus>>,

    /// Weak reference to the store
    store: Option<Weak<Mutex<NoteStore>>>,
}

impl TrashScheduler {
    pub fn new(interval: Duration) -> Self {
        info!("Initializing trash scheduler with interval {:?}", interval);
        Self {
            interval,
            command_tx: None,
            scheduler_task: None,
            status: Arc::new(std::sync::Mutex::new(TrashSchedulerStatus::default())),
            store: None,
        }
    }

    /// Set the weak reference to the store
    pub fn set_store(&mut self, store: &Arc<Mutex<NoteStore>>) {
        self.store = Some(Arc::downgrade(store));
        debug!("Store reference set in TrashScheduler");
    }

    /// Start the recurring cleanup. The first run happens one interval after
    /// start; process-start cleanup is done by `NoteStore::on_startup`.
    pub fn start(&mut self) -> Result<()> {
        if self.scheduler_task.is_some() {
            debug!("Trash scheduler already running");
            return Ok(());
        }
        if self.interval.is_zero() {
            info!("Periodic trash cleanup disabled");
            return Ok(());
        }

        let store = match self.store.as_ref().and_then(Weak::upgrade) {
            Some(store) => store,
            None => {
                error!("TrashScheduler has no live store reference");
                return Err(MemoraError::ApplicationError {
                    message: "TrashScheduler does not have a store reference.".to_string(),
                });
            }
        };
        let store = Arc::downgrade(&store);

        let (command_tx, mut command_rx) = mpsc::channel(10);
        self.command_tx = Some(command_tx);

        let period = self.interval;
        let status = Arc::clone(&self.status);

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.tick().await; // Initial tick

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !run_cleanup(&store, &status).await {
                            break;
                        }
                    }
                    Some(cmd) = command_rx.recv() => match cmd {
                        TrashCommand::RunNow => {
                            if !run_cleanup(&store, &status).await {
                                break;
                            }
                        }
                        TrashCommand::Stop => {
                            info!("Trash scheduler stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.scheduler_task = Some(task);
        if let Ok(mut status) = self.status.lock() {
            status.is_running = true;
        }
        Ok(())
    }

    /// Stop the scheduler if it's running
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.scheduler_task.take() else {
            debug!("Trash scheduler is not running");
            return Ok(());
        };

        if let Some(command_tx) = self.command_tx.take() {
            if let Err(e) = command_tx.send(TrashCommand::Stop).await {
                debug!("Trash scheduler already exited: {}", e);
            }
        }

        if let Err(e) = task.await {
            let message = format!("Failed to stop trash scheduler: {}", e);
            error!("{}", message);
            return Err(MemoraError::ApplicationError { message });
        }

        if let Ok(mut status) = self.status.lock() {
            status.is_running = false;
        }
        info!("Trash scheduler stopped");
        Ok(())
    }

    /// Run a cleanup now, regardless of the schedule
    pub async fn run_now(&self) -> Result<()> {
        let command_tx = self
            .command_tx
            .as_ref()
            .ok_or_else(|| MemoraError::ApplicationError {
                message: "Trash scheduler is not running".to_string(),
            })?;

        command_tx
            .send(TrashCommand::RunNow)
            .await
            .map_err(|e| MemoraError::ApplicationError {
                message: format!("Failed to send cleanup command: {}", e),
            })
    }

    pub fn get_status(&self) -> TrashSchedulerStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

/// Returns `false` once the store is gone
async fn run_cleanup(
    store: &Weak<Mutex<NoteStore>>,
    status: &std::sync::Mutex<TrashSchedulerStatus>,
) -> bool {
    let Some(store) = store.upgrade() else {
        info!("Store dropped, trash scheduler exiting");
        return false;
    };

    let purged = store.lock().await.cleanup_trash();
    if purged > 0 {
        info!("Scheduled trash cleanup purged {} notes", purged);
    } else {
        debug!("Scheduled trash cleanup found nothing to purge");
    }

    if let Ok(mut status) = status.lock() {
        status.last_run = Some(Utc::now());
        status.purged_total += purged;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, TRASH_RETENTION_MS};

    #[tokio::test]
    async fn run_now_purges_expired_trash() {
        let clock = Arc::new(ManualClock::new(0));
        let mut store = NoteStore::new(clock.clone());
        let id = store.add_note(None);
        store.delete_note(&id);
        clock.advance(TRASH_RETENTION_MS);
        let store = Arc::new(Mutex::new(store));

        let mut scheduler = TrashScheduler::new(Duration::from_secs(3600));
        scheduler.set_store(&store);
        scheduler.start().unwrap();
        assert!(scheduler.get_status().is_running);

        scheduler.run_now().await.unwrap();
        scheduler.stop().await.unwrap();

        assert!(store.lock().await.notes().is_empty());
        let status = scheduler.get_status();
        assert_eq!(status.purged_total, 1);
        assert!(status.last_run.is_some());
        assert!(!status.is_running);
    }

    #[tokio::test]
    async fn start_without_store_fails() {
        let mut scheduler = TrashScheduler::new(Duration::from_secs(1));
        assert!(scheduler.start().is_err());
        assert!(scheduler.run_now().await.is_err());
    }

    #[tokio::test]
    async fn zero_interval_disables_scheduler() {
        let store = Arc::new(Mutex::new(NoteStore::new(Arc::new(ManualClock::new(0)))));
        let mut scheduler = TrashScheduler::new(Duration::ZERO);
        scheduler.set_store(&store);

        scheduler.start().unwrap();
        assert!(!scheduler.get_status().is_running);
        scheduler.stop().await.unwrap();
    }
}
