//! The translation core of the proxy.
//!
//! Three dialect endpoints — OpenAI Chat Completions, OpenAI Responses and
//! Anthropic Messages — normalize into one canonical Chat Completions
//! request, talk to a single upstream (or echo back the request when none is
//! configured), and build the reply back in the caller's dialect, streaming
//! where the dialect supports it.

use std::{convert::Infallible, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response, Sse, sse::Event},
    routing::{get, post},
};
use axum_serde::Sonic;
use futures::{Stream, StreamExt, future, stream};
use serde_json::Value;
use uuid::Uuid;

mod assemble;
mod echo;
mod error;
mod http_client;
mod json_recovery;
mod messages;
mod projector;
mod translate;
mod upstream;

pub use error::{AnthropicResult, LlmError, LlmResult as Result};

use crate::{
    error::AnthropicErrorResponse,
    messages::openai::{ChatCompletionRequest, Model, ModelsResponse, ObjectType, StreamChunk},
    projector::AnthropicStreamProjector,
    upstream::{SseDataStream, UpstreamClient, UpstreamReply},
};

/// Creates an axum router for the dialect endpoints.
pub fn router(config: &config::Config) -> Router {
    let state = Arc::new(ProxyState::new(config));

    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/responses", post(responses))
        .route("/v1/messages", post(anthropic_messages))
        .route("/v1/models", get(list_models))
        .with_state(state)
}

struct ProxyState {
    backend: Backend,
    service_name: String,
    models: Vec<String>,
}

enum Backend {
    Upstream(UpstreamClient),
    Echo,
}

impl ProxyState {
    fn new(config: &config::Config) -> Self {
        let backend = match &config.upstream.base_url {
            Some(base_url) => Backend::Upstream(UpstreamClient::new(
                base_url.clone(),
                config.upstream.api_key.clone(),
            )),
            None => Backend::Echo,
        };

        Self {
            backend,
            service_name: config.service.name.clone(),
            models: config.upstream.models.clone(),
        }
    }

    fn is_echo(&self) -> bool {
        matches!(self.backend, Backend::Echo)
    }

    /// Opens one completion: against the upstream, or synthesized from the
    /// dialect's echoed payload when no upstream is configured.
    async fn open(&self, request: ChatCompletionRequest, echo_payload: Option<String>) -> Result<UpstreamReply> {
        match &self.backend {
            Backend::Upstream(client) => client.open_chat(request).await,
            Backend::Echo => {
                log::debug!("Echo mode: answering without upstream I/O");

                Ok(UpstreamReply::Complete(echo::outcome(
                    request.model,
                    echo_payload.unwrap_or_default(),
                )))
            }
        }
    }
}

/// Handle Chat Completions requests.
///
/// With `stream: true` the upstream SSE is re-published live with only the
/// `id` field rewritten; otherwise the stream is assembled into the buffered
/// envelope.
async fn chat_completions(
    State(state): State<Arc<ProxyState>>,
    Sonic(body): Sonic<Value>,
) -> Result<Response> {
    let mut request = translate::parse_chat(body)?;

    log::debug!("Chat completions handler called for model: {}", request.model);

    translate::normalize(&mut request);

    let wants_stream = request.stream.unwrap_or(false);
    let model = request.model.clone();

    let echo_payload = state
        .is_echo()
        .then(|| serde_json::to_string(&request.messages).unwrap_or_default());

    let reply = state.open(request, echo_payload).await?;

    if wants_stream {
        Ok(chat_stream_response(reply.into_events()))
    } else {
        let outcome = reply.collect(model).await?;
        Ok(Json(translate::chat_completion_response(outcome)).into_response())
    }
}

/// Handle Responses API requests. Output is always buffered.
async fn responses(State(state): State<Arc<ProxyState>>, Sonic(body): Sonic<Value>) -> Result<Response> {
    let request = translate::parse_responses(body)?;

    log::debug!("Responses handler called for model: {}", request.model);

    let chat = translate::from_responses(&request)?;
    let model = chat.model.clone();

    let echo_payload = state
        .is_echo()
        .then(|| request.input.as_ref().map(echo::payload_text).unwrap_or_default());

    let reply = state.open(chat, echo_payload).await?;
    let outcome = reply.collect(model).await?;

    Ok(Json(translate::response_envelope(&request, outcome)).into_response())
}

/// Handle Anthropic Messages requests.
///
/// With `stream: true` the upstream Chat Completions SSE is projected live
/// into the Anthropic event stream; otherwise it is assembled into the
/// non-streaming message.
async fn anthropic_messages(
    State(state): State<Arc<ProxyState>>,
    Sonic(body): Sonic<Value>,
) -> AnthropicResult<Response> {
    let request = translate::parse_anthropic(body).map_err(AnthropicErrorResponse::from)?;

    log::debug!("Anthropic messages handler called for model: {}", request.model);

    let chat = translate::from_anthropic(&request);
    let wants_stream = request.stream.unwrap_or(false);
    let model = request.model.clone();

    let echo_payload = state
        .is_echo()
        .then(|| serde_json::to_string(&request.messages).unwrap_or_default());

    let reply = state
        .open(chat, echo_payload)
        .await
        .map_err(AnthropicErrorResponse::from)?;

    if wants_stream {
        let projector = AnthropicStreamProjector::new(format!("msg_{}", Uuid::new_v4()), model);
        Ok(anthropic_stream_response(reply.into_events(), projector))
    } else {
        let outcome = reply.collect(model).await.map_err(AnthropicErrorResponse::from)?;
        Ok(Json(translate::message_response(outcome)).into_response())
    }
}

/// Handle model listing: proxied from the upstream, or served from the
/// configured list in echo mode.
async fn list_models(State(state): State<Arc<ProxyState>>) -> Result<Response> {
    match &state.backend {
        Backend::Upstream(client) => {
            let (status, body) = client.list_models().await?;
            Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
        }
        Backend::Echo => {
            let created = translate::now_seconds();
            let data = state
                .models
                .iter()
                .map(|id| Model {
                    id: id.clone(),
                    object: ObjectType::Model,
                    created,
                    owned_by: state.service_name.clone(),
                })
                .collect();

            Ok(Json(ModelsResponse {
                object: ObjectType::List,
                data,
            })
            .into_response())
        }
    }
}

/// Re-publishes a Chat Completions SSE with locally generated ids.
fn chat_stream_response(events: SseDataStream) -> Response {
    let stream_id = format!("chatcmpl-{}", Uuid::new_v4());

    let event_stream = events.scan((), move |_, item| {
        let event = match item {
            Ok(data) if data == "[DONE]" => Event::default().data("[DONE]"),
            Ok(data) => Event::default().data(rewrite_chunk_id(&data, &stream_id)),
            Err(error) => {
                log::error!("Ending chat completions stream early: {error}");
                return future::ready(None);
            }
        };

        future::ready(Some(Ok::<_, Infallible>(event)))
    });

    sse_response(event_stream)
}

/// Projects a Chat Completions SSE into the Anthropic event stream, one
/// upstream chunk at a time.
///
/// The downstream write is awaited before the next upstream chunk is read,
/// so a slow client backpressures the upstream instead of buffering in the
/// proxy.
fn anthropic_stream_response(events: SseDataStream, projector: AnthropicStreamProjector) -> Response {
    let event_stream = events
        .map(Some)
        .chain(stream::once(future::ready(None)))
        .scan(projector, |projector, item| {
            let events = match item {
                Some(Ok(data)) if data == "[DONE]" => projector.finish(),
                Some(Ok(data)) => match sonic_rs::from_str::<StreamChunk>(&data) {
                    Ok(chunk) => projector.process_chunk(&chunk),
                    Err(error) => {
                        log::warn!("Skipping unparseable upstream SSE payload: {error}");
                        Vec::new()
                    }
                },
                Some(Err(error)) => {
                    // Transport failure mid-stream: end the downstream SSE
                    // with no further events.
                    log::error!("Ending Anthropic stream early: {error}");
                    return future::ready(None);
                }
                None => projector.finish(),
            };

            future::ready(Some(stream::iter(events)))
        })
        .flatten()
        .map(|event| {
            let data = sonic_rs::to_string(&event).unwrap_or_else(|error| {
                log::error!("Failed to serialize Anthropic streaming event: {error}");
                "{}".to_string()
            });

            Ok::<_, Infallible>(Event::default().event(event.name()).data(data))
        });

    sse_response(event_stream)
}

/// The upstream chunk is forwarded as-is except for the `id`.
fn rewrite_chunk_id(data: &str, id: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(mut value) => {
            if let Some(object) = value.as_object_mut() {
                object.insert("id".to_string(), Value::String(id.to_string()));
            }
            value.to_string()
        }
        // Not JSON: forward untouched rather than drop it.
        Err(_) => data.to_string(),
    }
}

fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = std::result::Result<Event, Infallible>> + Send + 'static,
{
    // Reverse proxies must not buffer the event stream.
    ([("x-accel-buffering", "no")], Sse::new(stream)).into_response()
}
