//! Request extractors with consistent error responses.
//!
//! ## Authentication & Authorization
//!
//! - [`AuthClaims`] - JWT claims carrying capability grants
//! - [`AuthState`] - Verified caller extracted from the bearer token
//! - [`AccessProvider`] - Laboratory capability checks
//! - [`AuthResult`] - Result of authorization checks
//!
//! ## Request Data Extraction
//!
//! - [`Json`] - JSON (or base64-encoded JSON) bodies with readable errors
//! - [`ValidateJson`] - JSON extraction followed by validation

pub mod auth;
pub mod reject;

pub use crate::extract::auth::{
    AccessProvider, AuthClaims, AuthResult, AuthState, TRACING_TARGET_AUTHENTICATION,
    TRACING_TARGET_AUTHORIZATION,
};
pub use crate::extract::reject::{Json, ValidateJson};
