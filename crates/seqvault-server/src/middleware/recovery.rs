//! Request timeout and panic recovery.
//!
//! A handler that panics or runs past the timeout answers with the generic
//! `internal_server_error` body. The cause goes to the log.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::{Error, ErrorKind};

/// Tracing target for recovered failures.
const TRACING_TARGET: &str = "seqvault_server::middleware::recovery";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Limits applied to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds a request may take, S3 pagination included, before it is aborted.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::with_timeout_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

impl RecoveryConfig {
    pub fn with_timeout_secs(request_timeout: u64) -> Self {
        Self { request_timeout }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Extension trait for `axum::`[`Router`] to apply recovery middleware.
pub trait RouterRecoveryExt<S> {
    /// Adds the timeout and panic handlers.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        self.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(recover_error))
                .layer(CatchPanicLayer::custom(recover_panic))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
    }
}

async fn recover_error(error: tower::BoxError) -> Error<'static> {
    if error.is::<Elapsed>() {
        tracing::error!(target: TRACING_TARGET, "Request timed out");
        return ErrorKind::InternalServerError.with_context("request timed out");
    }

    tracing::error!(target: TRACING_TARGET, error = %error, "Middleware failed");
    ErrorKind::InternalServerError.with_context(error.to_string())
}

fn recover_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied());

    match detail {
        Some(detail) => tracing::error!(target: TRACING_TARGET, panic = detail, "Handler panicked"),
        None => tracing::error!(target: TRACING_TARGET, "Handler panicked"),
    }

    ErrorKind::InternalServerError.into_response()
}
