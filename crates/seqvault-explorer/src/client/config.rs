//! Configuration for the HTTP listing client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for listing requests: 60 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`HttpListingClient`].
///
/// [`HttpListingClient`]: crate::HttpListingClient
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct HttpListingConfig {
    /// Base URL of the listing service.
    #[cfg_attr(
        feature = "config",
        arg(long = "endpoint", env = "SEQVAULT_ENDPOINT", default_value = "http://127.0.0.1:8080")
    )]
    pub endpoint: Url,

    /// Bearer token sent with every request.
    #[cfg_attr(feature = "config", arg(long = "token", env = "SEQVAULT_TOKEN", hide_env_values = true))]
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Request timeout in seconds. Zero selects the default.
    #[cfg_attr(
        feature = "config",
        arg(long = "request-timeout", env = "SEQVAULT_REQUEST_TIMEOUT", default_value = "60")
    )]
    #[serde(default)]
    pub timeout_secs: u64,
}

impl HttpListingConfig {
    /// Creates a configuration for the given service URL.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the user agent sent with every request.
    pub fn user_agent(&self) -> String {
        format!("seqvault-explorer/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl std::fmt::Debug for HttpListingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListingConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
