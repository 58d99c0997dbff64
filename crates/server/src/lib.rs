//! HTTP shell around the translation core: status and health endpoints,
//! CORS, proxy-key authentication, and the listener itself.

mod auth;
mod cors;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use config::Config;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let listen_address = config.server.listen_address;
    let app = router(&config);

    let listener = TcpListener::bind(listen_address).await?;

    if config.upstream.echo_mode() {
        log::info!("No upstream configured, echo mode active");
    }
    log::info!(
        "{} {} listening on http://{listen_address}",
        config.service.name,
        config.service.version
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the full application router. Separate from [`serve`] so tests can
/// drive it in-process.
pub fn router(config: &Config) -> Router {
    let identity = Arc::new(ServiceIdentity {
        name: config.service.name.clone(),
        version: config.service.version.clone(),
    });

    let llm_routes = llm::router(config).layer(auth::ProxyKeyLayer::new(config.proxy_key.clone()));

    Router::new()
        .route("/", get(status))
        .route("/v1", get(status))
        .route("/health", get(health))
        .with_state(identity)
        .merge(llm_routes)
        .layer(cors::cors_layer())
}

struct ServiceIdentity {
    name: String,
    version: String,
}

async fn status(State(identity): State<Arc<ServiceIdentity>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": identity.name,
        "version": identity.version,
    }))
}

async fn health(State(identity): State<Arc<ServiceIdentity>>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": identity.name,
    }))
}
