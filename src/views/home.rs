//! The home page: every post, plus a background addition whose result is
//! only logged.

use std::time::Duration;

use askama::Template;
use tracing::info;

use super::ViewError;
use crate::app::AppState;
use crate::background::{AsyncResult, Job, QueueError, TaskQueue};
use crate::database::{Post, PostStore, StoreError};
use crate::http::Response;
use crate::template::HomeTemplate;

const ADD_OPERANDS: (i64, i64) = (2, 3);

/// How the bounded wait for the background task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Resolved(i64),
    StillRunning,
}

/// Everything the home page is rendered from.
#[derive(Debug)]
pub struct HomePage {
    pub template: HomeTemplate,
    pub task: TaskOutcome,
}

/// All posts, in the order the store returns them.
pub async fn list_posts<S: PostStore>(store: &S) -> Result<Vec<Post>, StoreError> {
    store.all().await
}

/// Submits `add(2, 3)` and waits at most `timeout` for it.
///
/// Only a timeout is handled here: it is logged and the task is left
/// running. Any other queue error is returned to the caller.
pub async fn dispatch_add<Q: TaskQueue>(
    queue: &Q,
    timeout: Duration,
) -> Result<TaskOutcome, QueueError> {
    let (x, y) = ADD_OPERANDS;
    let handle = queue.submit(Job::add(x, y)).await?;
    let result = AsyncResult::new(queue, handle.id());

    match result.get(timeout).await {
        Ok(value) => {
            info!(task_id = %result.id(), "Result: {value}");
            Ok(TaskOutcome::Resolved(value))
        }
        Err(QueueError::TimedOut { .. }) => {
            info!(task_id = %result.id(), ?timeout, "Task is still running");
            Ok(TaskOutcome::StillRunning)
        }
        Err(e) => Err(e),
    }
}

/// Lists posts and runs the bounded background task.
pub async fn prepare<S, Q>(store: &S, queue: &Q, timeout: Duration) -> Result<HomePage, ViewError>
where
    S: PostStore,
    Q: TaskQueue,
{
    let posts = list_posts(store).await?;
    let task = dispatch_add(queue, timeout).await?;
    Ok(HomePage {
        template: HomeTemplate::new(posts),
        task,
    })
}

/// `GET /`
pub async fn home<S, Q>(state: &AppState<S, Q>) -> Result<Response, ViewError>
where
    S: PostStore,
    Q: TaskQueue,
{
    let page = prepare(&state.store, &state.queue, state.result_timeout).await?;
    Ok(Response::html(page.template.render()?))
}
