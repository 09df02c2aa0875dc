//! Background tasks: submit work now, look the result up later.
//!
//! [`TaskQueue`] is the client-side contract: `submit` hands a [`Job`] to the
//! queue and returns a [`TaskHandle`] straight away, `await_result` blocks the
//! caller for at most a given timeout. [`AsyncResult`] binds a [`TaskId`] back
//! to a queue so a result can be polled from anywhere the id travels.
//!
//! [`LocalQueue`] runs jobs on an in-process pool of tokio workers.
//!
//! A task moves through
//!
//! ```text
//! Pending -> Started -> Success(value) | Failure(reason)
//! ```
//!
//! and nothing is ever cancelled: a caller that stops waiting leaves the task
//! running. Once finished, a task is only remembered for the queue's result
//! TTL.

mod job;
mod queue;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use job::{Job, JobError};
pub use queue::{DEFAULT_RESULT_TTL, LocalQueue};

/// Identifier of one submitted task. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Returned by [`TaskQueue::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    id: TaskId,
    name: &'static str,
}

impl TaskHandle {
    pub fn new(id: TaskId, name: &'static str) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Name of the submitted job, e.g. `add`.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Lifecycle state of a task as tracked by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Started,
    Success(i64),
    Failure(String),
}

impl TaskState {
    pub fn is_ready(&self) -> bool {
        matches!(self, TaskState::Success(_) | TaskState::Failure(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Started => "STARTED",
            TaskState::Success(_) => "SUCCESS",
            TaskState::Failure(_) => "FAILURE",
        }
    }
}

/// Errors reported by a task queue client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("task queue unavailable: {0}")]
    Unavailable(String),

    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("task {id} did not finish within {timeout:?}")]
    TimedOut { id: TaskId, timeout: Duration },

    #[error("task {id} failed: {reason}")]
    TaskFailed { id: TaskId, reason: String },

    #[error("result of task {0} was lost")]
    Lost(TaskId),
}

/// Client side of a task queue.
pub trait TaskQueue: Send + Sync + 'static {
    /// Enqueues `job` without waiting for it to run.
    ///
    /// # Errors
    ///
    /// [`QueueError::Unavailable`] when the queue does not accept work.
    fn submit(&self, job: Job) -> impl Future<Output = Result<TaskHandle, QueueError>> + Send;

    /// Waits at most `timeout` for task `id` to finish.
    ///
    /// # Errors
    ///
    /// - [`QueueError::TimedOut`] when `timeout` elapses first; the task keeps running.
    /// - [`QueueError::TaskFailed`] when the job itself failed.
    /// - [`QueueError::UnknownTask`] when `id` was never submitted here.
    fn await_result(
        &self,
        id: TaskId,
        timeout: Duration,
    ) -> impl Future<Output = Result<i64, QueueError>> + Send;

    /// Current state of task `id`, or `None` if it is unknown.
    fn state(&self, id: TaskId) -> impl Future<Output = Option<TaskState>> + Send;
}

/// A result poller bound to one task id on one queue.
///
/// ```rust
/// # async fn demo() -> Result<(), postboard::background::QueueError> {
/// use std::time::Duration;
/// use postboard::background::{AsyncResult, Job, LocalQueue, TaskQueue};
///
/// let queue = LocalQueue::start(1);
/// let handle = queue.submit(Job::add(2, 3)).await?;
/// let result = AsyncResult::new(&queue, handle.id());
/// assert_eq!(result.get(Duration::from_secs(1)).await?, 5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AsyncResult<'q, Q> {
    queue: &'q Q,
    id: TaskId,
}

impl<'q, Q: TaskQueue> AsyncResult<'q, Q> {
    pub fn new(queue: &'q Q, id: TaskId) -> Self {
        Self { queue, id }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub async fn state(&self) -> Option<TaskState> {
        self.queue.state(self.id).await
    }

    /// Blocks for at most `timeout` waiting for the value.
    pub async fn get(&self, timeout: Duration) -> Result<i64, QueueError> {
        self.queue.await_result(self.id, timeout).await
    }
}
