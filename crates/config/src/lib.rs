//! llm-proxy configuration structures, mapped from the process environment.

#![deny(missing_docs)]

mod server;
mod service;
mod upstream;

pub use secrecy::{ExposeSecret, SecretString};
pub use server::ServerConfig;
pub use service::ServiceConfig;
pub use upstream::UpstreamConfig;

/// Main configuration structure for the proxy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service identity reported by the status endpoints.
    pub service: ServiceConfig,
    /// HTTP server configuration settings.
    pub server: ServerConfig,
    /// Upstream Chat Completions endpoint configuration.
    pub upstream: UpstreamConfig,
    /// Shared key clients must present on the completion endpoints.
    /// When unset, the endpoints are open.
    pub proxy_key: Option<SecretString>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Config> {
        Self::load(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Tests inject their own lookup instead of mutating the process
    /// environment.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let service = ServiceConfig::load(&lookup);
        let server = ServerConfig::load(&lookup)?;
        let upstream = UpstreamConfig::load(&lookup);
        let proxy_key = non_empty(lookup("PROXY_KEY")).map(SecretString::from);

        Ok(Config {
            service,
            server,
            upstream,
            proxy_key,
        })
    }
}

/// Treats unset and empty variables the same way.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
