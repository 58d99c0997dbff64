use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Common HTTP client to re-use the same upstream connections.
///
/// There is deliberately no overall request timeout: reasoning models can
/// keep an SSE stream quiet for minutes (255 s and more) while the transport
/// keeps the socket open. Only the connection attempt itself is bounded.
pub(crate) fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Some(Duration::from_secs(5)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}
