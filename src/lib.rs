//! # postboard
//!
//! A small async web service: the home page lists every post and, on each
//! request, hands an addition to a background task queue, waits a bounded
//! time for the answer and logs it. The task's outcome never changes the
//! page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use postboard::app::{self, AppState};
//! use postboard::background::LocalQueue;
//! use postboard::database::MemoryStore;
//! use postboard::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = Arc::new(AppState {
//!         store: MemoryStore::new(),
//!         queue: LocalQueue::start(4),
//!         result_timeout: Duration::from_secs(5),
//!     });
//!     let router = Arc::new(app::routes(state));
//!
//!     let server = Server::bind("127.0.0.1:8000").await?;
//!     server
//!         .run(move |req| {
//!             let router = Arc::clone(&router);
//!             async move { router.route(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

// ── HTTP plumbing ─────────────────────────────────────────────────────────────
pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

// ── Collaborators ─────────────────────────────────────────────────────────────
pub mod background;
pub mod database;
pub mod template;

// ── Application ───────────────────────────────────────────────────────────────
pub mod app;
pub mod config;
pub mod logging;
pub mod views;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, IntoResponse, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
