//! Authenticated caller extractor.
//!
//! ```rust,ignore
//! async fn handler(auth_state: AuthState) -> Result<impl IntoResponse> {
//!     auth_state.authorize_storage_read(&laboratory)?;
//!     Ok("Success")
//! }
//! ```

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use axum_extra::typed_header::TypedHeaderRejectionReason;
use derive_more::Deref;

use super::{AuthClaims, TRACING_TARGET_AUTHENTICATION};
use crate::handler::{Error, ErrorKind, Result};
use crate::service::AuthKeys;

/// Caller identity taken from a verified bearer token.
///
/// Extraction fails with:
/// - [`ErrorKind::MissingAuthToken`] when no `Authorization` header is sent
/// - [`ErrorKind::MalformedAuthToken`] when the header or token cannot be parsed
/// - [`ErrorKind::Unauthorized`] when the signature, issuer, audience or expiry is wrong
///
/// The verified state is cached in request extensions.
#[derive(Debug, Clone, Deref, PartialEq, Eq)]
pub struct AuthState(pub AuthClaims);

impl AuthState {
    /// Wraps already verified claims.
    #[inline]
    #[must_use]
    pub const fn from_verified_claims(auth_claims: AuthClaims) -> Self {
        Self(auth_claims)
    }

    /// Verifies the bearer header against `auth_keys`.
    pub fn from_unverified_header(
        auth_header: TypedHeader<Authorization<Bearer>>,
        auth_keys: &AuthKeys,
    ) -> Result<Self> {
        let auth_claims = AuthClaims::from_header(auth_header, auth_keys)?;

        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            subject = %auth_claims.subject,
            expires_at = %auth_claims.expires_at(),
            "Caller authenticated"
        );

        Ok(Self::from_verified_claims(auth_claims))
    }
}

/// Maps a failed `Authorization: Bearer` header parse onto an auth error.
fn header_rejection(reason: &TypedHeaderRejectionReason) -> Error<'static> {
    let kind = match reason {
        TypedHeaderRejectionReason::Missing => ErrorKind::MissingAuthToken,
        TypedHeaderRejectionReason::Error(_) => ErrorKind::MalformedAuthToken,
        _ => return ErrorKind::InternalServerError.with_context("authorization header rejected"),
    };

    tracing::debug!(
        target: TRACING_TARGET_AUTHENTICATION,
        reason = kind.name(),
        "Bearer header rejected"
    );
    kind.with_resource("authentication")
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Sync + Send + 'static,
    AuthKeys: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<Self>() {
            return Ok(cached.clone());
        }

        let auth_header =
            <TypedHeader<Authorization<Bearer>> as FromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| header_rejection(rejection.reason()))?;

        let auth_keys = AuthKeys::from_ref(state);
        let auth_state = Self::from_unverified_header(auth_header, &auth_keys)?;

        parts.extensions.insert(auth_state.clone());
        Ok(auth_state)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthState
where
    S: Sync + Send + 'static,
    AuthKeys: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let verified = <Self as FromRequestParts<S>>::from_request_parts(parts, state).await;
        Ok(verified.ok())
    }
}

impl aide::OperationInput for AuthState {}
