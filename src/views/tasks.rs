//! `GET /tasks/:id`: look up a submitted task by its id.

use serde_json::json;

use crate::app::AppState;
use crate::background::{TaskId, TaskQueue, TaskState};
use crate::http::{Response, StatusCode};

/// Answers with the task's state as JSON, e.g.
///
/// ```json
/// {"id": "4b6f…", "state": "SUCCESS", "result": 5}
/// ```
///
/// `400` for a malformed id, `404` for an id this queue has never seen.
pub async fn status<S, Q>(state: &AppState<S, Q>, raw_id: &str) -> Response
where
    Q: TaskQueue,
{
    let Ok(id) = raw_id.parse::<TaskId>() else {
        return Response::json(
            StatusCode::BadRequest,
            &json!({ "error": format!("malformed task id: {raw_id}") }),
        );
    };

    let Some(task) = state.queue.state(id).await else {
        return Response::json(
            StatusCode::NotFound,
            &json!({ "error": format!("unknown task: {id}") }),
        );
    };

    let mut body = json!({ "id": id, "state": task.as_str() });
    match task {
        TaskState::Success(value) => body["result"] = json!(value),
        TaskState::Failure(reason) => body["error"] = json!(reason),
        TaskState::Pending | TaskState::Started => {}
    }
    Response::json(StatusCode::Ok, &body)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::background::{Job, LocalQueue};
    use crate::database::MemoryStore;

    fn app(queue: LocalQueue) -> AppState<MemoryStore, LocalQueue> {
        AppState {
            store: MemoryStore::new(),
            queue,
            result_timeout: Duration::from_secs(5),
        }
    }

    fn body(response: &Response) -> Value {
        serde_json::from_slice(response.body_ref()).unwrap()
    }

    #[tokio::test]
    async fn finished_task_reports_result() {
        let state = app(LocalQueue::start(1));
        let handle = state.queue.submit(Job::add(2, 3)).await.unwrap();
        state
            .queue
            .await_result(handle.id(), Duration::from_secs(2))
            .await
            .unwrap();

        let response = status(&state, &handle.id().to_string()).await;
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(
            body(&response),
            json!({ "id": handle.id().to_string(), "state": "SUCCESS", "result": 5 })
        );
    }

    #[tokio::test]
    async fn failed_task_reports_error() {
        let state = app(LocalQueue::start(1));
        let handle = state.queue.submit(Job::add(i64::MAX, 1)).await.unwrap();
        let _ = state
            .queue
            .await_result(handle.id(), Duration::from_secs(2))
            .await;

        let response = status(&state, &handle.id().to_string()).await;
        let json = body(&response);
        assert_eq!(json["state"], "FAILURE");
        assert!(json["error"].as_str().unwrap().contains("overflow"));
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let state = app(LocalQueue::start(1));
        let response = status(&state, "five").await;
        assert_eq!(response.status(), StatusCode::BadRequest);
    }

    #[tokio::test]
    async fn unknown_id_is_404() {
        let state = app(LocalQueue::start(1));
        let response = status(&state, &TaskId::new().to_string()).await;
        assert_eq!(response.status(), StatusCode::NotFound);
    }
}
