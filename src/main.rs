use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use postboard::app::{self, AppState};
use postboard::background::LocalQueue;
use postboard::config::Settings;
use postboard::database::MemoryStore;
use postboard::logging::logger_init;
use postboard::server::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::parse();
    logger_init(&settings.logger())?;

    let store = match &settings.fixture {
        Some(path) => MemoryStore::from_fixture(path).await?,
        None => MemoryStore::new(),
    };
    let queue = LocalQueue::with_result_ttl(settings.workers, settings.result_ttl());

    let state = Arc::new(AppState {
        store,
        queue,
        result_timeout: settings.result_timeout(),
    });
    let router = Arc::new(app::routes(state));

    let server = Server::bind(&settings.addr).await?;
    info!(
        address = %server.local_addr(),
        workers = settings.workers,
        result_timeout_ms = settings.result_timeout_ms,
        "postboard starting"
    );

    server
        .run_until(
            move |req| {
                let router = Arc::clone(&router);
                async move { router.route(req).await }
            },
            shutdown_signal(),
        )
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupt received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for interrupt, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
