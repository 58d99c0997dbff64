//! HTTP server configuration settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::bail;

use crate::non_empty;

/// HTTP server configuration settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The socket address the server listens on. The port comes from `PORT`,
    /// the host is always the wildcard address.
    pub listen_address: SocketAddr,
}

impl ServerConfig {
    pub(crate) fn load(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match non_empty(lookup("PORT")) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(_) => bail!("PORT must be a TCP port number, got '{raw}'"),
            },
            None => 3000,
        };

        Ok(Self {
            listen_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        })
    }
}
