//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── serve: ServeConfig
//! │   ├── server: ServerConfig         # Host, port, shutdown
//! │   ├── middleware: MiddlewareConfig # CORS, OpenAPI, request timeout
//! │   └── service: ServiceConfig       # Laboratories, auth keys, S3
//! └── browse: BrowseConfig             # Listing endpoint, laboratory, path
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod browse;
mod middleware;
mod server;
mod service;

use std::process;

use anyhow::Context;
pub use browse::BrowseConfig;
use clap::{Args, Parser, Subcommand};
pub use middleware::MiddlewareConfig;
pub use server::ServerConfig;
pub use service::ServiceConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_SERVER_STARTUP;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "seqvault")]
#[command(about = "Laboratory object listings and storage browser")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Runs the listing HTTP service.
    Serve(ServeConfig),
    /// Prints one directory level of a laboratory's storage.
    Browse(BrowseConfig),
}

/// Configuration of the `serve` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeConfig {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Laboratory directory, token verification and object store.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl ServeConfig {
    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        Ok(())
    }

    /// Logs configuration (no key material).
    pub fn log(&self) {
        self.server.log();
        self.middleware.log();
        self.service.log();
    }
}

impl Cli {
    /// Loads the `.env` file (if enabled) and parses CLI arguments.
    ///
    /// The `.env` file is read first so clap can use its values as
    /// environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs build information and the selected command's configuration.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        match &self.command {
            Command::Serve(config) => config.log(),
            Command::Browse(config) => config.log(),
        }
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
