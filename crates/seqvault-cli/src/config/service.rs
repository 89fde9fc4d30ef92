//! Service configuration with CLI argument parsing.
//!
//! ```bash
//! # Shared-secret tokens and a local MinIO
//! seqvault serve --auth-secret "$JWT_SECRET" \
//!     --laboratories-file ./laboratories.json \
//!     --s3-endpoint http://localhost:9000 --s3-force-path-style
//!
//! # EdDSA tokens and AWS credentials from the environment
//! AUTH_PUBLIC_PEM_FILEPATH=./public.pem S3_REGION=eu-west-1 seqvault serve
//! ```

use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use seqvault_server::service::{DEFAULT_AUDIENCE, DEFAULT_ISSUER, ServiceConfig as ServerServiceConfig};
use seqvault_storage::s3::S3Config;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// CLI service configuration, converted into the server's [`ServerServiceConfig`].
#[derive(Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// JSON file listing the known laboratories.
    #[arg(long, env = "LABORATORIES_FILE", default_value = "./laboratories.json")]
    pub laboratories_file: PathBuf,

    /// Shared HMAC secret used to verify HS256 tokens.
    #[arg(long, env = "AUTH_SECRET", hide_env_values = true)]
    #[serde(default, skip_serializing)]
    pub auth_secret: Option<String>,

    /// File path to the Ed25519 public key used to verify EdDSA tokens.
    #[arg(long, env = "AUTH_PUBLIC_PEM_FILEPATH")]
    pub auth_public_key: Option<PathBuf>,

    /// Expected `iss` claim.
    #[arg(long, env = "AUTH_ISSUER", default_value = DEFAULT_ISSUER)]
    pub auth_issuer: String,

    /// Expected `aud` claim.
    #[arg(long, env = "AUTH_AUDIENCE", default_value = DEFAULT_AUDIENCE)]
    pub auth_audience: String,

    /// Object store connection.
    #[clap(flatten)]
    pub s3: S3Config,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("laboratories_file", &self.laboratories_file)
            .field("auth_secret", &self.auth_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_public_key", &self.auth_public_key)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_audience", &self.auth_audience)
            .field("s3_region", &self.s3.region)
            .field("s3_endpoint", &self.s3.endpoint)
            .finish_non_exhaustive()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            laboratories_file: "./laboratories.json".into(),
            auth_secret: None,
            auth_public_key: None,
            auth_issuer: DEFAULT_ISSUER.to_owned(),
            auth_audience: DEFAULT_AUDIENCE.to_owned(),
            s3: S3Config::default(),
        }
    }
}

impl ServiceConfig {
    /// Logs the service configuration without key material.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            laboratories_file = %self.laboratories_file.display(),
            auth = if self.auth_secret.is_some() { "hs256" } else { "eddsa" },
            auth_issuer = %self.auth_issuer,
            auth_audience = %self.auth_audience,
            s3_region = ?self.s3.region,
            s3_endpoint = ?self.s3.endpoint,
            "Service configuration"
        );
    }
}

impl TryFrom<ServiceConfig> for ServerServiceConfig {
    type Error = anyhow::Error;

    fn try_from(cli_config: ServiceConfig) -> Result<Self, Self::Error> {
        let mut builder = ServerServiceConfig::builder()
            .with_laboratories_file(cli_config.laboratories_file)
            .with_auth_issuer(cli_config.auth_issuer)
            .with_auth_audience(cli_config.auth_audience)
            .with_s3(cli_config.s3);

        if let Some(secret) = cli_config.auth_secret {
            builder = builder.with_auth_secret(secret);
        }

        if let Some(public_key) = cli_config.auth_public_key {
            builder = builder.with_auth_public_key(public_key);
        }

        builder.build().context("invalid service configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn converts_with_secret() -> anyhow::Result<()> {
        let cli_config = ServiceConfig {
            auth_secret: Some(SECRET.to_owned()),
            s3: S3Config::default().with_region("eu-west-1"),
            ..ServiceConfig::default()
        };

        let server_config = ServerServiceConfig::try_from(cli_config)?;
        assert_eq!(server_config.auth_secret.as_deref(), Some(SECRET));
        assert_eq!(server_config.auth_issuer, DEFAULT_ISSUER);
        assert_eq!(server_config.s3.region.as_deref(), Some("eu-west-1"));
        Ok(())
    }

    #[test]
    fn requires_key_material() {
        let result = ServerServiceConfig::try_from(ServiceConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let cli_config = ServiceConfig {
            auth_secret: Some(SECRET.to_owned()),
            ..ServiceConfig::default()
        };
        assert!(!format!("{cli_config:?}").contains(SECRET));
    }
}
