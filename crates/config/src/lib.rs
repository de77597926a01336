//! Atrium configuration structures to map the atrium.toml configuration.

#![deny(missing_docs)]

mod loader;
mod rate_limit;
mod routes;
mod session;

use std::{
    borrow::Cow,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use duration_str::deserialize_duration;
pub use rate_limit::{RateLimitConfig, RateLimitQuota};
pub use routes::{RouteClass, RoutesConfig};
use serde::Deserialize;
pub use session::SessionConfig;
use url::Url;

/// Main configuration structure for the Atrium gateway.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    pub server: ServerConfig,
    /// Route classification for access control and cache policy.
    pub routes: RoutesConfig,
    /// Session token validation settings.
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}

/// HTTP server configuration settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// TLS configuration for secure connections.
    pub tls: Option<TlsServerConfig>,
    /// Health endpoint configuration.
    pub health: HealthConfig,
    /// The upstream content application the gateway fronts.
    pub upstream: UpstreamConfig,
    /// Rate limiting configuration.
    pub rate_limits: RateLimitConfig,
}

/// TLS configuration for secure connections.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsServerConfig {
    /// Path to the TLS certificate PEM file.
    pub certificate: PathBuf,
    /// Path to the TLS private key PEM file.
    pub key: PathBuf,
}

/// Health endpoint configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    /// Whether the health endpoint is enabled.
    pub enabled: bool,
    /// The socket address the health endpoint should listen on.
    ///
    /// When unset, the endpoint is served from the main listener.
    pub listen: Option<SocketAddr>,
    /// The path for the health endpoint.
    pub path: Cow<'static, str>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            enabled: true,
            listen: None,
            path: Cow::Borrowed("/health"),
        }
    }
}

/// Upstream origin configuration.
///
/// The content application (pages, admin forms, CRUD endpoints) is an
/// external collaborator; every request the gate admits is forwarded here.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the upstream application.
    pub url: Url,
    /// Connection timeout for upstream requests.
    #[serde(deserialize_with = "deserialize_duration")]
    pub connect_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            url: Url::parse("http://127.0.0.1:3000").expect("default upstream URL is valid"),
            connect_timeout: Duration::from_secs(5),
        }
    }
}
