//! Background worker for import jobs
//!
//! Jobs are dispatched over a bounded channel and processed start to end by
//! one worker task each; a source can have at most one active import at a
//! time. Task states live on a shared board the API polls.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

use polyport_judge::ProfileId;

use crate::job::{run_import, ImportJob, ImportServices};
use crate::reporter::{TaskReporter, TaskState};

/// Named stages a job reports
pub const IMPORT_STAGES: u32 = 5;

type TaskBoard = Arc<DashMap<Uuid, TaskState>>;

struct QueuedJob {
    task_id: Uuid,
    job: ImportJob,
}

/// Why a dispatch was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The source already has an active import
    #[error("an import for this problem source is already running")]
    AlreadyRunning,
    /// The worker queue is at capacity
    #[error("import queue is full")]
    QueueFull,
}

/// Handle for submitting jobs and polling their states
#[derive(Clone)]
pub struct ImportDispatcher {
    sender: mpsc::Sender<QueuedJob>,
    board: TaskBoard,
    active: Arc<DashMap<Uuid, Uuid>>,
}

impl ImportDispatcher {
    /// Queue an import for a source; at most one runs per source at a time
    pub fn dispatch(&self, source_id: Uuid, author: ProfileId) -> Result<Uuid, DispatchError> {
        use dashmap::mapref::entry::Entry;

        let task_id = Uuid::new_v4();
        match self.active.entry(source_id) {
            Entry::Occupied(_) => return Err(DispatchError::AlreadyRunning),
            Entry::Vacant(vacant) => {
                vacant.insert(task_id);
            }
        }

        let queued = QueuedJob {
            task_id,
            job: ImportJob { source_id, author },
        };
        if self.sender.try_send(queued).is_err() {
            self.active.remove(&source_id);
            return Err(DispatchError::QueueFull);
        }

        self.board.insert(task_id, TaskState::Working { stage: None });
        Ok(task_id)
    }

    /// Current state of a task, if known
    pub fn task_state(&self, task_id: &Uuid) -> Option<TaskState> {
        self.board.get(task_id).map(|state| state.clone())
    }
}

/// Reporter writing stage progress to the task board
struct WorkerReporter {
    board: TaskBoard,
    task_id: Uuid,
    done: AtomicU32,
}

impl TaskReporter for WorkerReporter {
    fn report(&self, stage: &str) {
        let done = (self.done.fetch_add(1, Ordering::Relaxed) + 1).min(IMPORT_STAGES);
        self.board.insert(
            self.task_id,
            TaskState::Progress {
                done,
                total: IMPORT_STAGES,
                stage: stage.to_string(),
            },
        );
    }
}

/// The worker pool; call [`ImportWorker::run`] on a spawned task
pub struct ImportWorker {
    services: Arc<ImportServices>,
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    board: TaskBoard,
    active: Arc<DashMap<Uuid, Uuid>>,
    shutdown_rx: watch::Receiver<bool>,
    concurrency: usize,
}

/// Build the dispatcher/worker pair plus a shutdown trigger.
///
/// Queue capacity and concurrency come from the worker section of the
/// application config.
pub fn import_worker(
    services: Arc<ImportServices>,
) -> (ImportDispatcher, ImportWorker, watch::Sender<bool>) {
    let worker_config = &services.config.worker;
    let (sender, receiver) = mpsc::channel(worker_config.queue_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let board: TaskBoard = Arc::new(DashMap::new());
    let active = Arc::new(DashMap::new());

    let dispatcher = ImportDispatcher {
        sender,
        board: Arc::clone(&board),
        active: Arc::clone(&active),
    };
    let concurrency = worker_config.concurrency;
    let worker = ImportWorker {
        services,
        receiver: Arc::new(Mutex::new(receiver)),
        board,
        active,
        shutdown_rx,
        concurrency,
    };

    (dispatcher, worker, shutdown_tx)
}

/// Resolve once shutdown is signalled.
///
/// A dropped sender is not a shutdown; jobs keep draining until every
/// dispatcher is gone and the channel closes.
async fn wait_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl ImportWorker {
    /// Process jobs until shutdown is signalled or every dispatcher is gone
    pub async fn run(self) {
        info!("Import worker started (concurrency: {})", self.concurrency);

        let mut join_set = JoinSet::new();
        for worker_id in 0..self.concurrency {
            let services = Arc::clone(&self.services);
            let receiver = Arc::clone(&self.receiver);
            let board = Arc::clone(&self.board);
            let active = Arc::clone(&self.active);
            let mut shutdown = self.shutdown_rx.clone();

            join_set.spawn(async move {
                loop {
                    let queued = {
                        let mut receiver = receiver.lock().await;
                        tokio::select! {
                            queued = receiver.recv() => queued,
                            () = wait_shutdown(&mut shutdown) => None,
                        }
                    };
                    let Some(queued) = queued else { break };

                    tracing::debug!(
                        "Worker {worker_id}: processing import task {}",
                        queued.task_id
                    );
                    board.insert(queued.task_id, TaskState::Working { stage: None });

                    let reporter = WorkerReporter {
                        board: Arc::clone(&board),
                        task_id: queued.task_id,
                        done: AtomicU32::new(0),
                    };

                    match run_import(&queued.job, &services, &reporter).await {
                        Ok(()) => {
                            board.insert(queued.task_id, TaskState::Success);
                        }
                        Err(import_error) => {
                            error!(
                                source_id = %queued.job.source_id,
                                error = %import_error,
                                "Import job failed"
                            );
                            board.insert(
                                queued.task_id,
                                TaskState::Failure {
                                    error: import_error.to_string(),
                                },
                            );
                        }
                    }

                    active.remove(&queued.job.source_id);
                }
                tracing::debug!("Worker {worker_id} shutting down");
            });
        }

        while let Some(result) = join_set.join_next().await {
            if let Err(join_error) = result {
                error!(error = %join_error, "Worker task panicked");
            }
        }

        info!("Import worker stopped");
    }
}
