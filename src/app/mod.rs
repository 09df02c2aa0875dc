//! Wires the store and the task queue into a [`Router`].

use std::sync::Arc;
use std::time::Duration;

use crate::background::TaskQueue;
use crate::context::Context;
use crate::database::PostStore;
use crate::middleware::LoggerMiddleware;
use crate::router::Router;
use crate::views;

/// Everything a view needs, shared by all requests.
#[derive(Debug)]
pub struct AppState<S, Q> {
    pub store: S,
    pub queue: Q,
    /// Upper bound on how long the home page waits for its background task.
    pub result_timeout: Duration,
}

/// Builds the service's routes:
///
/// - `GET /`: the home page
/// - `GET /tasks/:id`: JSON state of a submitted task
pub fn routes<S, Q>(state: Arc<AppState<S, Q>>) -> Router
where
    S: PostStore,
    Q: TaskQueue,
{
    let mut router = Router::new();
    router.layer(LoggerMiddleware);

    let home_state = Arc::clone(&state);
    router.get("/", move |_ctx: Context| {
        let state = Arc::clone(&home_state);
        async move { views::home::home(&state).await }
    });

    router.get("/tasks/:id", move |ctx: Context| {
        let state = Arc::clone(&state);
        async move {
            let id = ctx.params().get("id").unwrap_or_default();
            views::tasks::status(&state, id).await
        }
    });

    router
}
