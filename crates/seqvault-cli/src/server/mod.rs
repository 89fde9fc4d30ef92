//! Listener startup and graceful shutdown.

mod shutdown;

use std::future::IntoFuture;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use self::shutdown::shutdown_signal;
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Serves `app` until SIGINT or SIGTERM.
///
/// After a signal, open requests get `shutdown_timeout` to finish before the
/// remaining connections are dropped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(app: Router, config: ServerConfig) -> io::Result<()> {
    let addr = config.server_addr();
    let listener = TcpListener::bind(addr).await.inspect_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            %addr,
            error = %err,
            hint = bind_hint(err),
            "Cannot bind listener"
        );
    })?;

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Listening on every interface, make sure the port is firewalled"
        );
    }
    tracing::info!(target: TRACING_TARGET_SERVER_STARTUP, %addr, "Listening");

    let started = Instant::now();
    let result = run_until_shutdown(listener, app, config.shutdown_timeout()).await;
    let uptime_secs = started.elapsed().as_secs();

    match &result {
        Ok(()) => tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            uptime_secs,
            "Server stopped"
        ),
        Err(err) => tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            uptime_secs,
            "Server failed"
        ),
    }

    result
}

async fn run_until_shutdown(
    listener: TcpListener,
    app: Router,
    shutdown_timeout: std::time::Duration,
) -> io::Result<()> {
    let signalled = Arc::new(Notify::new());

    let graceful = {
        let signalled = signalled.clone();
        async move {
            shutdown_signal().await;
            signalled.notify_one();
        }
    };

    let deadline = async move {
        signalled.notified().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .into_future();

    tokio::select! {
        result = server => result,
        () = deadline => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown_timeout.as_secs(),
                "Requests still open after the shutdown timeout, dropping them"
            );
            Ok(())
        }
    }
}

/// Operator hint for common bind failures.
fn bind_hint(err: &io::Error) -> Option<&'static str> {
    match err.kind() {
        io::ErrorKind::AddrInUse => Some("another process holds this port, pick a different --port"),
        io::ErrorKind::PermissionDenied => Some("ports below 1024 need elevated privileges"),
        io::ErrorKind::AddrNotAvailable => Some("--host is not an address of this machine"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    #[tokio::test]
    async fn occupied_port_fails_to_bind() -> anyhow::Result<()> {
        let taken = TcpListener::bind("127.0.0.1:0").await?;
        let SocketAddr::V4(addr) = taken.local_addr()? else {
            anyhow::bail!("expected an IPv4 address");
        };

        let config = ServerConfig {
            host: (*addr.ip()).into(),
            port: addr.port(),
            ..ServerConfig::default()
        };

        let error = serve(Router::new(), config).await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::AddrInUse);
        Ok(())
    }

    #[test]
    fn hints_for_bind_failures() {
        assert!(bind_hint(&io::Error::from(io::ErrorKind::AddrInUse)).is_some());
        assert!(bind_hint(&io::Error::from(io::ErrorKind::PermissionDenied)).is_some());
        assert!(bind_hint(&io::Error::other("boom")).is_none());
    }
}
