//! Key material used to verify bearer tokens.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, encode};
use serde::Serialize;

use crate::{Error, Result};

/// Tracing target for key loading and token signing.
const TRACING_TARGET: &str = "seqvault_server::auth_keys";

/// Default expected `iss` claim.
pub const DEFAULT_ISSUER: &str = "seqvault";

/// Default expected `aud` claim.
pub const DEFAULT_AUDIENCE: &str = "seqvault:server";

/// Keys and expectations for bearer token verification.
///
/// Tokens are either signed with a shared HMAC secret (HS256) or with an
/// Ed25519 key whose public half is loaded from a PEM file (EdDSA). Only the
/// shared-secret variant can issue tokens.
#[derive(Clone)]
pub struct AuthKeys {
    inner: Arc<AuthKeysInner>,
}

struct AuthKeysInner {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: Option<EncodingKey>,
    issuer: String,
    audience: String,
}

impl AuthKeys {
    /// Creates keys from a shared HMAC secret.
    pub fn from_secret(
        secret: impl AsRef<[u8]>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let secret = secret.as_ref();
        let inner = AuthKeysInner {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret),
            encoding_key: Some(EncodingKey::from_secret(secret)),
            issuer: issuer.into(),
            audience: audience.into(),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Loads an Ed25519 public key from a PEM file.
    pub async fn from_public_pem(
        path: impl AsRef<Path>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref();

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            "Loading decoding key from file",
        );

        let pem_data = tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %e,
                "Failed to read decoding key file",
            );
            Error::file_system("failed to read decoding key file").with_source(e)
        })?;

        let decoding_key = DecodingKey::from_ed_pem(&pem_data).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %e,
                "Failed to parse decoding key PEM data",
            );
            Error::auth("invalid decoding key PEM format").with_source(e)
        })?;

        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            "Decoding key loaded",
        );

        let inner = AuthKeysInner {
            algorithm: Algorithm::EdDSA,
            decoding_key,
            encoding_key: None,
            issuer: issuer.into(),
            audience: audience.into(),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the signature algorithm tokens must use.
    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.inner.algorithm
    }

    /// Returns the key used to verify signatures.
    #[inline]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.inner.decoding_key
    }

    /// Returns the expected issuer.
    #[inline]
    pub fn issuer(&self) -> &str {
        &self.inner.issuer
    }

    /// Returns the expected audience.
    #[inline]
    pub fn audience(&self) -> &str {
        &self.inner.audience
    }

    /// Signs `claims` into a compact JWT.
    ///
    /// Fails for key sets that only hold a public key.
    pub fn issue_token<T: Serialize>(&self, claims: &T) -> Result<String> {
        let Some(encoding_key) = &self.inner.encoding_key else {
            return Err(Error::auth("no signing key configured"));
        };

        encode(&Header::new(self.algorithm()), claims, encoding_key).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %e,
                "Failed to sign token",
            );
            Error::auth("token signing failed").with_source(e)
        })
    }
}

impl fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKeys")
            .field("algorithm", &self.inner.algorithm)
            .field("issuer", &self.inner.issuer)
            .field("audience", &self.inner.audience)
            .finish_non_exhaustive()
    }
}
