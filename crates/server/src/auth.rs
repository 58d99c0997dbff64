//! Proxy-key authentication for the completion endpoints.
//!
//! When a proxy key is configured, the two OpenAI-shaped POST endpoints
//! require `x-proxy-key`, and the Anthropic endpoint accepts either
//! `x-api-key` or a bearer token. Rejections answer in the dialect of the
//! guarded endpoint. Everything else passes through untouched.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use config::{ExposeSecret, SecretString};
use http::{HeaderMap, Method, Request, Response, StatusCode, header};
use tower::Layer;

#[derive(Clone)]
pub(crate) struct ProxyKeyLayer(Arc<Option<SecretString>>);

impl ProxyKeyLayer {
    pub(crate) fn new(key: Option<SecretString>) -> Self {
        Self(Arc::new(key))
    }
}

impl<Service> Layer<Service> for ProxyKeyLayer
where
    Service: Send + Clone,
{
    type Service = ProxyKeyService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        ProxyKeyService {
            next,
            key: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ProxyKeyService<Service> {
    next: Service,
    key: Arc<Option<SecretString>>,
}

/// Which credential a request must present.
enum Guard {
    Open,
    ProxyKeyHeader,
    ApiKeyOrBearer,
}

fn guard_for(method: &Method, path: &str) -> Guard {
    if method != Method::POST {
        return Guard::Open;
    }

    match path {
        "/v1/chat/completions" | "/v1/responses" => Guard::ProxyKeyHeader,
        "/v1/messages" => Guard::ApiKeyOrBearer,
        _ => Guard::Open,
    }
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for ProxyKeyService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let key = self.key.clone();

        Box::pin(async move {
            let Some(key) = key.as_ref() else {
                return next.call(req).await;
            };

            match guard_for(req.method(), req.uri().path()) {
                Guard::Open => next.call(req).await,
                Guard::ProxyKeyHeader => {
                    if header_matches(req.headers(), "x-proxy-key", key) {
                        next.call(req).await
                    } else {
                        Ok(openai_unauthorized())
                    }
                }
                Guard::ApiKeyOrBearer => {
                    if header_matches(req.headers(), "x-api-key", key) || bearer_matches(req.headers(), key) {
                        next.call(req).await
                    } else {
                        Ok(anthropic_unauthorized())
                    }
                }
            }
        })
    }
}

fn header_matches(headers: &HeaderMap, name: &str, key: &SecretString) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == key.expose_secret())
}

fn bearer_matches(headers: &HeaderMap, key: &SecretString) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == key.expose_secret())
}

fn openai_unauthorized() -> Response<Body> {
    json_response(StatusCode::UNAUTHORIZED, r#"{"error":{"message":"Unauthorized"}}"#)
}

fn anthropic_unauthorized() -> Response<Body> {
    json_response(
        StatusCode::UNAUTHORIZED,
        r#"{"type":"error","error":{"type":"authentication_error","message":"Invalid API key"}}"#,
    )
}

fn json_response(status: StatusCode, body: &'static str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("static response must build")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completion_posts_are_guarded() {
        assert!(matches!(
            guard_for(&Method::POST, "/v1/chat/completions"),
            Guard::ProxyKeyHeader
        ));
        assert!(matches!(guard_for(&Method::POST, "/v1/responses"), Guard::ProxyKeyHeader));
        assert!(matches!(guard_for(&Method::POST, "/v1/messages"), Guard::ApiKeyOrBearer));
        assert!(matches!(guard_for(&Method::GET, "/v1/models"), Guard::Open));
        assert!(matches!(guard_for(&Method::GET, "/v1/chat/completions"), Guard::Open));
    }

    #[test]
    fn bearer_token_comparison_requires_the_scheme() {
        let key = SecretString::from("hunter2");
        let mut headers = HeaderMap::new();

        headers.insert(header::AUTHORIZATION, "Bearer hunter2".parse().unwrap());
        assert!(bearer_matches(&headers, &key));

        headers.insert(header::AUTHORIZATION, "hunter2".parse().unwrap());
        assert!(!bearer_matches(&headers, &key));
    }
}
