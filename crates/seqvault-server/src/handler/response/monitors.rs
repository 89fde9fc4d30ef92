//! Monitor response types.

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Liveness status of the service.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Whether the service is able to serve requests.
    pub is_healthy: bool,
    /// Timestamp when this status was generated.
    pub updated_at: Timestamp,
    /// Application version.
    pub version: String,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            is_healthy: true,
            updated_at: Timestamp::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
