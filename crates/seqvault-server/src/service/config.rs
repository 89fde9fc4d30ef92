use std::path::PathBuf;

use derive_builder::Builder;
use seqvault_storage::ObjectStorage;
use seqvault_storage::s3::{S3Config, S3Lister};
use serde::{Deserialize, Serialize};

use crate::service::{AuthKeys, Directory, StaticDirectory};
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    use std::path::PathBuf;

    /// Default path to the laboratories file.
    pub fn laboratories_file() -> PathBuf {
        "./laboratories.json".into()
    }

    /// Default expected token issuer.
    pub const AUTH_ISSUER: &str = crate::service::DEFAULT_ISSUER;

    /// Default expected token audience.
    pub const AUTH_AUDIENCE: &str = crate::service::DEFAULT_AUDIENCE;

    /// Shortest accepted shared secret, in bytes.
    pub const MIN_SECRET_LEN: usize = 32;
}

/// App [`state`] configuration.
///
/// Exactly one of `auth_secret` and `auth_public_key` selects how bearer
/// tokens are verified.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// JSON file listing the known laboratories.
    #[builder(default = "defaults::laboratories_file()")]
    pub laboratories_file: PathBuf,

    /// Shared HMAC secret used to verify HS256 tokens.
    #[builder(default)]
    #[serde(default, skip_serializing)]
    pub auth_secret: Option<String>,

    /// File path to the Ed25519 public key used to verify EdDSA tokens.
    #[builder(default)]
    #[serde(default)]
    pub auth_public_key: Option<PathBuf>,

    /// Expected `iss` claim.
    #[builder(default = "defaults::AUTH_ISSUER.to_string()")]
    pub auth_issuer: String,

    /// Expected `aud` claim.
    #[builder(default = "defaults::AUTH_AUDIENCE.to_string()")]
    pub auth_audience: String,

    /// Object store connection settings.
    #[builder(default)]
    #[serde(default)]
    pub s3: S3Config,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Connects to the configured S3-compatible object store.
    pub async fn connect_storage(&self) -> Result<ObjectStorage> {
        let lister = S3Lister::connect(&self.s3).await?;
        Ok(lister.into_storage())
    }

    /// Loads the laboratory directory.
    pub async fn load_directory(&self) -> Result<Directory> {
        let directory = StaticDirectory::from_file(&self.laboratories_file).await?;
        Ok(Directory::new(directory))
    }

    /// Loads the token verification keys.
    pub async fn load_auth_keys(&self) -> Result<AuthKeys> {
        match (&self.auth_secret, &self.auth_public_key) {
            (Some(secret), None) => Ok(AuthKeys::from_secret(
                secret,
                &self.auth_issuer,
                &self.auth_audience,
            )),
            (None, Some(path)) => {
                AuthKeys::from_public_pem(path, &self.auth_issuer, &self.auth_audience).await
            }
            (Some(_), Some(_)) => Err(Error::config(
                "configure either an auth secret or an auth public key, not both",
            )),
            (None, None) => Err(Error::config(
                "an auth secret or an auth public key is required",
            )),
        }
    }
}

impl ServiceConfigBuilder {
    fn validate(builder: &ServiceConfigBuilder) -> Result<(), String> {
        let secret = builder.auth_secret.clone().flatten();
        let public_key = builder.auth_public_key.clone().flatten();

        match (&secret, &public_key) {
            (Some(_), Some(_)) => {
                return Err("Auth secret and auth public key are mutually exclusive".to_string());
            }
            (None, None) => {
                return Err("Either an auth secret or an auth public key is required".to_string());
            }
            _ => {}
        }

        if let Some(secret) = secret
            && secret.len() < defaults::MIN_SECRET_LEN
        {
            return Err(format!(
                "Auth secret must be at least {} bytes long",
                defaults::MIN_SECRET_LEN
            ));
        }

        if let Some(issuer) = &builder.auth_issuer
            && issuer.is_empty()
        {
            return Err("Auth issuer cannot be empty".to_string());
        }

        if let Some(audience) = &builder.auth_audience
            && audience.is_empty()
        {
            return Err("Auth audience cannot be empty".to_string());
        }

        Ok(())
    }
}
