//! CORS, OpenAPI and request timeout flags for `seqvault serve`.

use clap::Args;
use seqvault_server::middleware::{CorsConfig, OpenApiConfig, RecoveryConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Settings for the router layers, each with a matching env var.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    #[clap(flatten)]
    pub cors: CorsConfig,

    #[clap(flatten)]
    pub openapi: OpenApiConfig,

    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    pub fn log(&self) {
        let Self {
            cors,
            openapi,
            recovery,
        } = self;

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            cors_origins = ?cors.allowed_origins,
            cors_credentials = cors.allow_credentials,
            openapi_json = %openapi.open_api_json,
            scalar_ui = %openapi.scalar_ui,
            request_timeout_secs = recovery.request_timeout,
            "Middleware configuration"
        );
    }
}
