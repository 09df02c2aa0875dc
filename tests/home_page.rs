use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use postboard::app::{self, AppState};
use postboard::background::{Job, LocalQueue, TaskQueue};
use postboard::database::{MemoryStore, NewPost};
use postboard::server::{Server, ServerError};

async fn spawn_app(store: MemoryStore, queue: LocalQueue) -> (SocketAddr, JoinHandle<Result<(), ServerError>>) {
    let state = Arc::new(AppState {
        store,
        queue,
        result_timeout: Duration::from_secs(5),
    });
    let router = Arc::new(app::routes(state));

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    let handle = tokio::spawn(server.run(move |req| {
        let router = Arc::clone(&router);
        async move { router.route(req).await }
    }));
    (addr, handle)
}

async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_owned())
        .unwrap_or_default();
    (status, body)
}

fn post(title: &str, author: &str) -> NewPost {
    NewPost {
        title: title.to_owned(),
        content: format!("{title} content"),
        author: author.to_owned(),
    }
}

#[tokio::test]
async fn home_lists_posts_in_order() {
    let store = MemoryStore::seeded([post("Hello", "ana"), post("World", "bo")]);
    let (addr, server) = spawn_app(store, LocalQueue::start(2)).await;

    let (status, body) = get(addr, "/").await;
    assert_eq!(status, 200);
    assert_eq!(body.matches("<article").count(), 2);
    assert!(body.find("Hello").unwrap() < body.find("World").unwrap());

    server.abort();
}

#[tokio::test]
async fn empty_home_still_renders() {
    let (addr, server) = spawn_app(MemoryStore::new(), LocalQueue::start(1)).await;

    let (status, body) = get(addr, "/").await;
    assert_eq!(status, 200);
    assert!(body.contains("No posts yet."));

    server.abort();
}

#[tokio::test]
async fn unreachable_queue_is_a_server_error() {
    let queue = LocalQueue::start(1);
    queue.close();
    let (addr, server) = spawn_app(MemoryStore::new(), queue).await;

    let (status, body) = get(addr, "/").await;
    assert_eq!(status, 500);
    assert!(!body.contains("<html"));

    server.abort();
}

#[tokio::test]
async fn task_status_endpoint() {
    let queue = LocalQueue::start(1);
    let handle = queue.submit(Job::add(2, 3)).await.unwrap();
    queue
        .await_result(handle.id(), Duration::from_secs(2))
        .await
        .unwrap();
    let (addr, server) = spawn_app(MemoryStore::new(), queue).await;

    let (status, body) = get(addr, &format!("/tasks/{}", handle.id())).await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["state"], "SUCCESS");
    assert_eq!(json["result"], 5);

    let (status, _) = get(addr, "/tasks/not-a-task").await;
    assert_eq!(status, 400);

    let (status, _) = get(addr, "/nope").await;
    assert_eq!(status, 404);

    server.abort();
}
