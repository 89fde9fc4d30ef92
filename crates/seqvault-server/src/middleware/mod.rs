//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Recovery (panics, timeouts)
//! - Observability (tracing spans, request IDs)
//! - Security (CORS, headers, body limits)
//! - OpenAPI documentation
//!
//! ```rust,ignore
//! use axum::Router;
//! use seqvault_server::middleware::*;
//!
//! let app: Router = routes()
//!     .with_state(state)
//!     .with_open_api(OpenApiConfig::default())
//!     .with_security(&CorsConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
