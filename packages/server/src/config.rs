//! Command-line and environment configuration for the gridstore server.

use std::time::Duration;

use clap::Parser;

use crate::network::NetworkConfig;

/// gridstore server configuration.
///
/// Every flag can also come from the environment, which is how deployments
/// are expected to configure the server.
#[derive(Debug, Clone, Parser)]
#[command(name = "gridstore", version, about = "A directory of tables over HTTP")]
pub struct ServerConfig {
    /// Host address to bind to.
    #[arg(long, default_value = "0.0.0.0", env = "GRIDSTORE_HOST")]
    pub host: String,

    /// Port to listen on. 0 picks an OS-assigned port.
    #[arg(long, default_value_t = 8080, env = "GRIDSTORE_PORT")]
    pub port: u16,

    /// Maximum seconds a request may take before timing out.
    #[arg(long, default_value_t = 30, env = "GRIDSTORE_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Comma-separated allowed CORS origins. "*" allows any origin.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "*",
        env = "GRIDSTORE_CORS_ORIGINS"
    )]
    pub cors_origins: Vec<String>,

    /// Port for the Prometheus metrics exporter. Disabled when unset.
    #[arg(long, env = "GRIDSTORE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Log filter, e.g. "info" or "gridstore_server=debug".
    #[arg(long, default_value = "info", env = "GRIDSTORE_LOG")]
    pub log_filter: String,
}

impl ServerConfig {
    /// Network-layer view of this configuration.
    #[must_use]
    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
