//! CORS policy: any origin, the standard methods, and the headers browser
//! clients of the proxy actually send.

use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

pub(crate) fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-proxy-key"),
        ])
}
