//! Listener address and shutdown settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::ensure;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Ports that do not need elevated privileges.
const UNPRIVILEGED_PORTS: RangeInclusive<u16> = 1024..=u16::MAX;

/// Accepted shutdown timeouts, in seconds.
const SHUTDOWN_TIMEOUT_SECS: RangeInclusive<u64> = 1..=300;

/// Where `seqvault serve` listens.
///
/// The per-request timeout is part of the middleware settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Address to bind, `0.0.0.0` for every interface.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds open requests may run after SIGINT or SIGTERM.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    /// Rejects privileged ports and shutdown timeouts outside 1 to 300 seconds.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            UNPRIVILEGED_PORTS.contains(&self.port),
            "port {} needs root, choose one from 1024 upwards",
            self.port
        );
        ensure!(
            SHUTDOWN_TIMEOUT_SECS.contains(&self.shutdown_timeout),
            "shutdown timeout of {}s is outside {}..={}s",
            self.shutdown_timeout,
            SHUTDOWN_TIMEOUT_SECS.start(),
            SHUTDOWN_TIMEOUT_SECS.end()
        );
        Ok(())
    }

    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    #[must_use]
    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            addr = %self.server_addr(),
            loopback = self.host.is_loopback(),
            shutdown_timeout_secs = self.shutdown_timeout,
            "Server configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.binds_to_all_interfaces());
        assert_eq!(config.server_addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn privileged_port_is_rejected() {
        let config = ServerConfig {
            port: 443,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shutdown_timeout_bounds() {
        for (secs, valid) in [(0, false), (1, true), (300, true), (301, false)] {
            let config = ServerConfig {
                shutdown_timeout: secs,
                ..ServerConfig::default()
            };
            assert_eq!(config.validate().is_ok(), valid, "{secs}s");
        }
    }

    #[test]
    fn unspecified_host() {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ..ServerConfig::default()
        };
        assert!(config.binds_to_all_interfaces());
    }
}
