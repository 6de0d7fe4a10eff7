use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use storefront_api::app::{self, services};
use storefront_api::worker::SyncWorker;
use storefront_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    // The one failure that may abort startup: missing credentials cannot be
    // retried into existence.
    let config = Config::from_env().context("configuration incomplete")?;
    let bind_addr = config.bind_addr.clone();
    let sync_interval = Duration::from_secs(config.tunables.sync_worker_interval_secs);

    let services = Arc::new(services::build_services(config));

    let worker = SyncWorker::new(services.stock.clone(), sync_interval);
    let _worker_handle = worker.start();

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
