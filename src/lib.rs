pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod ports;
pub mod push;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::push::{DrainCoordinator, Notifier};
use crate::store::Database;

pub use crate::error::{Error, Result};

/// Serves until Ctrl-C or SIGTERM, then waits for in-flight fan-outs to
/// finish before the database is released.
pub async fn serve(config: config::AppConfig) -> anyhow::Result<()> {
    let db = Arc::new(Database::open(&config.db_path)?);
    let sender = WebPushSender::new(config.vapid.clone())?;
    let notifier = Notifier::new(db, sender, TokioTimeProvider, DrainCoordinator::new());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = state::AppState::new(config, notifier.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(in_flight = notifier.drain().in_flight(), "draining notifications");
    notifier.drain().wait().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(err) => {
                tracing::warn!("failed to install SIGTERM handler: {err}");
                let _ = ctrl_c.await;
                info!("received Ctrl+C, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received Ctrl+C, shutting down");
    }
}
