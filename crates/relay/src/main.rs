use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use openclaw_relay::{
    config::Config,
    metrics,
    openclaw::OpenClawClient,
    queue::DeliveryQueue,
    server::Server,
    Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::load()?;
    metrics::register_metrics();

    info!(
        addr = %config.server.addr,
        openclaw_url = %config.openclaw.base_url,
        openclaw_model = %config.openclaw.model,
        webhook_auth = config.server.webhook_token.is_some(),
        queue_capacity = config.queue.capacity,
        "starting openclaw-relay"
    );

    // Initialize the delivery pipeline
    let client = Arc::new(OpenClawClient::new(&config.openclaw)?);
    let queue = Arc::new(DeliveryQueue::new(client, config.queue.capacity));
    queue.start();

    // Start server
    let app = Server::new(&config, queue.clone()).build_router();
    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    info!("listening on {}", config.server.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain buffered alerts before exiting.
    info!("http server stopped, draining delivery queue");
    queue.stop().await;
    info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal, cleaning up...");
}
