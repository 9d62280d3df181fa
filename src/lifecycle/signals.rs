//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT/SIGTERM (Ctrl+C on non-unix targets)
//! - Trigger graceful stop, then exit with code 0
//!
//! # Design Decisions
//! - One task per server, installed after a successful start and aborted by
//!   `stop()` so a later start does not stack handlers
//! - First signal wins; the task exits the process once the adapter drains

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::adapter::HttpAdapter;
use crate::lifecycle::Shutdown;

/// Spawn the signal listener task.
///
/// On the first termination signal the task triggers the shutdown broadcast,
/// stops the adapter, and exits the process.
pub fn spawn_signal_task(adapter: Arc<dyn HttpAdapter>, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;

        tracing::info!("Termination signal received, stopping server");
        shutdown.trigger();

        if let Err(e) = adapter.stop().await {
            tracing::error!(error = %e, "Adapter stop failed during signal shutdown");
        }

        std::process::exit(0);
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGINT handler");
            return std::future::pending().await;
        }
    };
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
