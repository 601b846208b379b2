//! gridstore server daemon.
//!
//! Binds the HTTP listener, serves the table directory, and shuts down
//! gracefully on SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridstore_server::config::ServerConfig;
use gridstore_server::gateway::Gateway;
use gridstore_server::network::NetworkModule;
use gridstore_server::storage::BackendFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Some(metrics_port) = config.metrics_port {
        let addr = format!("{}:{metrics_port}", config.host)
            .parse::<std::net::SocketAddr>()
            .context("invalid metrics address")?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to start metrics exporter")?;
        info!("metrics exporter listening on {addr}");
    }

    let gateway = Arc::new(Gateway::new(BackendFactory::default())?);

    let mut network = NetworkModule::new(config.network());
    let port = network.start().await.context("failed to bind listener")?;
    info!("gridstore listening on {}:{port}", config.host);

    network
        .serve(Arc::clone(&gateway), shutdown_signal())
        .await?;

    gateway.shutdown().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
