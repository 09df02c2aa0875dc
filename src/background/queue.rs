//! In-process task queue backed by a pool of tokio workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{Job, QueueError, TaskHandle, TaskId, TaskQueue, TaskState};

// A job on its way to a worker, together with the channel its state is published on.
struct Envelope {
    id: TaskId,
    job: Job,
    state: watch::Sender<TaskState>,
}

/// How long a finished task stays queryable when no TTL is given.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(300);

struct Entry {
    observer: watch::Receiver<TaskState>,
    /// When the sweeper first saw the task finished.
    finished_at: Option<Instant>,
}

struct Shared {
    sender: mpsc::UnboundedSender<Envelope>,
    tasks: RwLock<HashMap<TaskId, Entry>>,
    closed: AtomicBool,
}

/// Task queue whose broker and workers live in the current process.
///
/// Jobs go through an unbounded channel to `workers` tokio tasks; each task's
/// state is published on its own `watch` channel so any number of waiters can
/// observe it. A finished task stays queryable for the result TTL, after
/// which a background sweeper forgets it.
///
/// Cloning is cheap and every clone talks to the same workers.
#[derive(Clone)]
pub struct LocalQueue {
    shared: Arc<Shared>,
}

impl LocalQueue {
    /// Spawns `workers` worker tasks on the current tokio runtime, keeping
    /// finished tasks for [`DEFAULT_RESULT_TTL`].
    ///
    /// With zero workers nothing can receive jobs and every submission fails
    /// with [`QueueError::Unavailable`].
    pub fn start(workers: usize) -> Self {
        Self::with_result_ttl(workers, DEFAULT_RESULT_TTL)
    }

    /// Like [`LocalQueue::start`], but finished tasks are forgotten
    /// `result_ttl` after they finish.
    pub fn with_result_ttl(workers: usize, result_ttl: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));

        for index in 0..workers {
            tokio::spawn(work(index, Arc::clone(&receiver)));
        }

        let shared = Arc::new(Shared {
            sender,
            tasks: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        });
        tokio::spawn(sweep(Arc::downgrade(&shared), result_ttl));
        debug!(workers, ?result_ttl, "task queue started");

        Self { shared }
    }

    /// Stops accepting new jobs. Jobs already queued still run.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Number of tasks currently queryable, finished or not.
    pub async fn tracked(&self) -> usize {
        self.shared.tasks.read().await.len()
    }

    async fn receiver(&self, id: TaskId) -> Option<watch::Receiver<TaskState>> {
        self.shared
            .tasks
            .read()
            .await
            .get(&id)
            .map(|entry| entry.observer.clone())
    }
}

impl TaskQueue for LocalQueue {
    async fn submit(&self, job: Job) -> Result<TaskHandle, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Unavailable("queue is closed".to_owned()));
        }

        let id = TaskId::new();
        let name = job.name();
        let (state, observer) = watch::channel(TaskState::Pending);
        let entry = Entry {
            observer,
            finished_at: None,
        };
        self.shared.tasks.write().await.insert(id, entry);

        if self.shared.sender.send(Envelope { id, job, state }).is_err() {
            self.shared.tasks.write().await.remove(&id);
            return Err(QueueError::Unavailable("no workers are running".to_owned()));
        }

        debug!(task_id = %id, job = name, "task submitted");
        Ok(TaskHandle::new(id, name))
    }

    async fn await_result(&self, id: TaskId, timeout: Duration) -> Result<i64, QueueError> {
        let mut observer = self.receiver(id).await.ok_or(QueueError::UnknownTask(id))?;

        let waited = tokio::time::timeout(timeout, async {
            observer
                .wait_for(TaskState::is_ready)
                .await
                .map(|state| state.clone())
        })
        .await;

        match waited {
            Err(_) => Err(QueueError::TimedOut { id, timeout }),
            Ok(Err(_)) => Err(QueueError::Lost(id)),
            Ok(Ok(TaskState::Success(value))) => Ok(value),
            Ok(Ok(TaskState::Failure(reason))) => Err(QueueError::TaskFailed { id, reason }),
            Ok(Ok(_)) => Err(QueueError::Lost(id)),
        }
    }

    async fn state(&self, id: TaskId) -> Option<TaskState> {
        self.receiver(id)
            .await
            .map(|observer| observer.borrow().clone())
    }
}

async fn work(index: usize, receiver: Arc<Mutex<mpsc::UnboundedReceiver<Envelope>>>) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(Envelope { id, job, state }) = next else {
            debug!(worker = index, "task channel closed, worker exiting");
            break;
        };

        state.send_replace(TaskState::Started);
        let outcome = match job.run() {
            Ok(value) => {
                debug!(worker = index, task_id = %id, %job, value, "task succeeded");
                TaskState::Success(value)
            }
            Err(e) => {
                warn!(worker = index, task_id = %id, %job, error = %e, "task failed");
                TaskState::Failure(e.to_string())
            }
        };
        state.send_replace(outcome);
    }
}

fn sweep_period(ttl: Duration) -> Duration {
    (ttl / 2).clamp(Duration::from_millis(10), Duration::from_secs(30))
}

/// Forgets tasks that finished at least `ttl` ago. Exits once the queue is dropped.
async fn sweep(shared: Weak<Shared>, ttl: Duration) {
    let mut ticker = tokio::time::interval(sweep_period(ttl));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };

        let now = Instant::now();
        let mut tasks = shared.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, entry| {
            // A closed channel means the worker dropped the task without a final state.
            let done = entry.observer.borrow().is_ready() || entry.observer.has_changed().is_err();
            if entry.finished_at.is_none() && done {
                entry.finished_at = Some(now);
            }
            entry
                .finished_at
                .is_none_or(|at| now.duration_since(at) < ttl)
        });

        let expired = before - tasks.len();
        if expired > 0 {
            debug!(expired, remaining = tasks.len(), "expired finished tasks");
        }
    }
}
