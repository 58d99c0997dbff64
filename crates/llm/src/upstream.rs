//! The single upstream Chat Completions endpoint.
//!
//! Every completion request is sent with `stream=true`; the reply is either
//! a live SSE stream or, for upstreams that ignore the flag, a buffered
//! body. Both shapes normalize into [`UpstreamReply`] so handlers never
//! care which one they got.

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{StreamExt, stream::BoxStream};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use crate::{
    assemble::{self, CompletionOutcome},
    error::{LlmError, LlmResult},
    http_client::http_client,
    messages::openai::{ChatCompletionRequest, ChatCompletionResponse},
};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MODELS_PATH: &str = "/v1/models";

/// Raw SSE data payloads from the upstream, `[DONE]` marker included.
pub(crate) type SseDataStream = BoxStream<'static, LlmResult<String>>;

/// What one upstream call produced.
pub(crate) enum UpstreamReply {
    /// A live SSE stream.
    Events(SseDataStream),
    /// A buffered completion, already parsed.
    Complete(CompletionOutcome),
}

impl UpstreamReply {
    /// Normalizes the reply into a chunk stream; buffered completions are
    /// re-published as a synthetic two-payload stream.
    pub(crate) fn into_events(self) -> SseDataStream {
        match self {
            UpstreamReply::Events(events) => events,
            UpstreamReply::Complete(outcome) => {
                let payloads: Vec<LlmResult<String>> = outcome.to_sse_payloads().into_iter().map(Ok).collect();
                futures::stream::iter(payloads).boxed()
            }
        }
    }

    /// Drains the reply to completion.
    pub(crate) async fn collect(self, model: String) -> LlmResult<CompletionOutcome> {
        match self {
            UpstreamReply::Events(events) => assemble::collect(events, model).await,
            UpstreamReply::Complete(outcome) => Ok(outcome),
        }
    }
}

pub(crate) struct UpstreamClient {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl UpstreamClient {
    pub(crate) fn new(base_url: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client: http_client(),
            base_url,
            api_key,
        }
    }

    /// Derives the concrete endpoint for a target pathname.
    ///
    /// A base URL that already carries a path is treated as a full chat
    /// completions endpoint and used unchanged; everything else resolves
    /// against the base URL's origin.
    fn endpoint(&self, path: &str) -> Url {
        if path == CHAT_COMPLETIONS_PATH && !matches!(self.base_url.path(), "" | "/") {
            return self.base_url.clone();
        }

        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Opens one completion against the upstream. No retries.
    pub(crate) async fn open_chat(&self, mut request: ChatCompletionRequest) -> LlmResult<UpstreamReply> {
        request.stream = Some(true);
        let model = request.model.clone();

        let body = sonic_rs::to_vec(&request)
            .map_err(|error| LlmError::Internal(Some(format!("Failed to serialize upstream request: {error}"))))?;

        let mut builder = self
            .client
            .post(self.endpoint(CHAT_COMPLETIONS_PATH))
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| LlmError::Connection(format!("Failed to send request to upstream: {error}")))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Upstream API error ({status}): {body}");
            return Err(upstream_api_error(status, body));
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("text/event-stream"));

        if is_event_stream {
            let events = response
                .bytes_stream()
                .eventsource()
                .map(|event| match event {
                    Ok(event) => Ok(event.data),
                    Err(error) => Err(LlmError::Connection(format!("Upstream stream failed: {error}"))),
                })
                .boxed();

            return Ok(UpstreamReply::Events(events));
        }

        // Some upstreams answer a stream=true request with a plain JSON
        // completion.
        let body = response
            .text()
            .await
            .map_err(|error| LlmError::Connection(format!("Failed to read upstream response: {error}")))?;

        match sonic_rs::from_str::<ChatCompletionResponse>(&body) {
            Ok(parsed) => Ok(UpstreamReply::Complete(CompletionOutcome::from_chat_response(
                parsed, model,
            ))),
            Err(error) => {
                log::error!("Upstream returned 2xx with an unusable body: {error}");
                log::debug!("Unusable upstream body, length: {} bytes", body.len());

                Err(LlmError::UpstreamShape(
                    "expected an SSE stream or a chat completion object".to_string(),
                ))
            }
        }
    }

    /// Proxies the upstream model listing, body and status verbatim.
    pub(crate) async fn list_models(&self) -> LlmResult<(StatusCode, Bytes)> {
        let mut builder = self.client.get(self.endpoint(MODELS_PATH));

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| LlmError::Connection(format!("Failed to request upstream models: {error}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| LlmError::Connection(format!("Failed to read upstream models: {error}")))?;

        Ok((status, bytes))
    }
}

/// Pulls a short human-readable message out of an upstream error body.
fn upstream_api_error(status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            let nested = value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str);

            nested
                .or_else(|| value.get("message").and_then(Value::as_str))
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("upstream request failed with status {status}"));

    LlmError::UpstreamApi {
        status: status.as_u16(),
        message,
        body: Some(body),
    }
}
