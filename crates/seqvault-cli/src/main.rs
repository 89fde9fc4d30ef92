#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod browse;
mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use seqvault_server::handler::routes;
use seqvault_server::middleware::{
    RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt, RouterSecurityExt,
};
use seqvault_server::service::{ServiceConfig, ServiceState};

use crate::config::{Cli, Command, MiddlewareConfig, ServeConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "seqvault_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "seqvault_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "seqvault_cli::config";
pub const TRACING_TARGET_BROWSE: &str = "seqvault_cli::browse";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();

    match cli.command {
        Command::Serve(config) => serve(config).await,
        Command::Browse(config) => browse::run(config).await,
    }
}

/// Runs the listing service until a shutdown signal arrives.
async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting seqvault server"
    );

    let service_config = ServiceConfig::try_from(config.service)?;
    let state = ServiceState::from_config(&service_config)
        .await
        .context("failed to create service state")?;

    let router = create_router(state, &config.middleware);
    server::serve(router, config.server).await?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Security - CORS, security headers, compression
/// 4. Routes (innermost) - listing, health and OpenAPI handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    let api_routes: Router = routes()
        .with_open_api(middleware.openapi.clone())
        .with_state(state);

    api_routes
        .with_security(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
