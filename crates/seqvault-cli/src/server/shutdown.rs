//! Shutdown signal handling.

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;

use crate::TRACING_TARGET_SERVER_SHUTDOWN as TRACING_TARGET;

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let interrupt = async {
        match ctrl_c().await {
            Ok(()) => tracing::info!(target: TRACING_TARGET, "Received Ctrl+C"),
            Err(e) => {
                tracing::error!(target: TRACING_TARGET, error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(target: TRACING_TARGET, "Received SIGTERM");
            }
            Err(e) => {
                tracing::error!(target: TRACING_TARGET, error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }

    tracing::info!(target: TRACING_TARGET, "Graceful shutdown initiated");
}
