use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use jsonwebtoken::{Validation, decode};
use serde::{Deserialize, Serialize};

use super::TRACING_TARGET_AUTHENTICATION;
use crate::handler::{Error, ErrorKind, Result};
use crate::service::AuthKeys;

/// JWT claims carried by bearer tokens.
///
/// Access is granted through `groups`, which hold capability grants such as
/// `org/{org}/admin` or `org/{org}/lab/{lab}/technician`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthClaims {
    // Standard (or registered) claims.
    /// Issuer (who created the token).
    #[serde(rename = "iss")]
    issued_by: String,
    /// Audience (who the token is intended for).
    #[serde(rename = "aud")]
    audience: String,
    /// Subject (the caller).
    #[serde(rename = "sub")]
    pub subject: String,
    /// Issued at, in seconds since the epoch.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration time, in seconds since the epoch.
    #[serde(rename = "exp")]
    pub expires_at: i64,

    // Private (or custom) claims
    /// Email address of the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Capability grants held by the caller.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl AuthClaims {
    /// Creates claims for `subject` valid for `lifetime` from now.
    pub fn new(keys: &AuthKeys, subject: impl Into<String>, lifetime: SignedDuration) -> Self {
        let now = Timestamp::now();
        let expires_at = now.checked_add(lifetime).unwrap_or(now);

        Self {
            issued_by: keys.issuer().to_owned(),
            audience: keys.audience().to_owned(),
            subject: subject.into(),
            issued_at: now.as_second(),
            expires_at: expires_at.as_second(),
            email: None,
            groups: Vec::new(),
        }
    }

    /// Sets the email claim.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Adds a capability grant.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Returns the issuer.
    #[inline]
    pub fn issued_by(&self) -> &str {
        &self.issued_by
    }

    /// Returns the audience.
    #[inline]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Returns the expiration time.
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_second(self.expires_at).unwrap_or(Timestamp::UNIX_EPOCH)
    }

    /// Checks if the token has expired.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at() <= Timestamp::now()
    }

    /// Parses and validates a token from an Authorization header.
    ///
    /// Verifies the signature with `keys`, checks `exp`, `iss` and `aud`, and
    /// requires the `sub` claim.
    pub fn from_header(
        auth_header: TypedHeader<Authorization<Bearer>>,
        keys: &AuthKeys,
    ) -> Result<Self> {
        Self::from_token(auth_header.token(), keys)
    }

    /// Parses and validates a compact JWT.
    pub fn from_token(token: &str, keys: &AuthKeys) -> Result<Self> {
        let mut validation = Validation::new(keys.algorithm());
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = true;
        validation.set_audience(&[keys.audience()]);
        validation.set_issuer(&[keys.issuer()]);
        validation.set_required_spec_claims(&["iss", "aud", "sub", "exp"]);

        let token_data = decode::<Self>(token, keys.decoding_key(), &validation)?;
        let claims = token_data.claims;

        if claims.is_expired() {
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                subject = %claims.subject,
                expired_at = %claims.expires_at(),
                "Token validation failed: token expired"
            );

            return Err(ErrorKind::Unauthorized
                .with_message("Authentication session has expired")
                .with_resource("authentication"));
        }

        tracing::debug!(
            target: TRACING_TARGET_AUTHENTICATION,
            subject = %claims.subject,
            groups = claims.groups.len(),
            "Token validation completed"
        );

        Ok(claims)
    }
}

impl From<JwtError> for Error<'static> {
    fn from(error: JwtError) -> Self {
        tracing::debug!(
            target: TRACING_TARGET_AUTHENTICATION,
            error = %error,
            "Token rejected"
        );

        match error.kind() {
            JwtErrorKind::ExpiredSignature => ErrorKind::Unauthorized
                .with_message("Your session has expired")
                .with_context("Please sign in again to continue"),
            JwtErrorKind::InvalidToken => ErrorKind::MalformedAuthToken
                .with_message("Authentication token is invalid")
                .with_context("The provided token format is unrecognized"),
            JwtErrorKind::InvalidSignature => ErrorKind::Unauthorized
                .with_message("Authentication token verification failed")
                .with_context("Token signature could not be verified"),
            JwtErrorKind::InvalidAlgorithm => ErrorKind::MalformedAuthToken
                .with_message("Authentication token uses unsupported format")
                .with_context("Token was signed with an incompatible algorithm"),
            JwtErrorKind::InvalidAudience => ErrorKind::Unauthorized
                .with_message("Authentication token is not valid for this service")
                .with_context("Token was issued for a different application"),
            JwtErrorKind::InvalidIssuer => ErrorKind::Unauthorized
                .with_message("Authentication token is from an untrusted source")
                .with_context("Token was not issued by this authentication system"),
            JwtErrorKind::MissingRequiredClaim(claim) => ErrorKind::MalformedAuthToken
                .with_message("Authentication token is incomplete")
                .with_context(format!("Token is missing required field: {}", claim)),
            JwtErrorKind::Base64(_) => ErrorKind::MalformedAuthToken
                .with_message("Authentication token format is corrupted")
                .with_context("Token contains invalid base64 encoding"),
            JwtErrorKind::Json(_) => ErrorKind::MalformedAuthToken
                .with_message("Authentication token structure is invalid")
                .with_context("Token payload contains malformed data"),
            JwtErrorKind::InvalidKeyFormat => ErrorKind::MalformedAuthToken
                .with_message("Authentication token encoding is invalid")
                .with_context("Token contains invalid key format"),
            _ => ErrorKind::InternalServerError
                .with_context("An unexpected error occurred during token validation"),
        }
    }
}
