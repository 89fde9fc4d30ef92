//! Authentication and authorization.
//!
//! - [`AuthClaims`] - JWT claims structure
//! - [`AuthState`] - Authenticated caller extracted from the bearer token
//! - [`AccessProvider`] - Laboratory capability checks
//! - [`AuthResult`] - Result of authorization checks

mod access_provider;
mod auth_state;
mod jwt_claims;

pub use self::access_provider::{AccessProvider, AuthResult};
pub use self::auth_state::AuthState;
pub use self::jwt_claims::AuthClaims;

/// Tracing target for token validation.
pub const TRACING_TARGET_AUTHENTICATION: &str = "seqvault_server::authentication";

/// Tracing target for capability checks.
pub const TRACING_TARGET_AUTHORIZATION: &str = "seqvault_server::authorization";

impl AccessProvider for AuthClaims {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }
}
