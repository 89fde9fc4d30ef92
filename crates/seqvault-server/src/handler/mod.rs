//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use axum::Router;
//! use seqvault_server::handler::routes;
//! use seqvault_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example(config: ServiceConfig) -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&config).await?;
//! let router: Router = routes().with_state(state).into();
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod monitors;
mod objects;
mod response;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::{ErrorResponse, MonitorStatus};
use crate::service::ServiceState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes.
///
/// Unknown paths answer with a `not_found` error body.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(objects::routes())
        .merge(monitors::routes())
        .fallback(fallback)
}
