//! Echo-mode integration tests: the full router driven in-process, no
//! network, no upstream.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn echo_router() -> Router {
    let config = config::Config::load(|_| None).unwrap();
    llm::router(&config)
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn post_sse(router: Router, uri: &str, body: Value) -> (StatusCode, String) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn responses_echo_round_trip() {
    let (status, body) = post_json(echo_router(), "/v1/responses", json!({"model": "m", "input": "hi"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "m");
    assert_eq!(body["object"], "response");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["output_text"], "hi");
    assert_eq!(body["output"][0]["type"], "message");
    assert_eq!(body["output"][0]["content"][0]["text"], "hi");
    assert_eq!(body["usage"]["output_tokens"], 1);
}

#[tokio::test]
async fn responses_missing_input_is_rejected() {
    let (status, body) = post_json(echo_router(), "/v1/responses", json!({"model": "m"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn chat_echo_returns_the_stringified_messages() {
    let (status, body) = post_json(
        echo_router(),
        "/v1/chat/completions",
        json!({"model": "m", "messages": [{"role": "user", "content": "x"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "m");
    assert_eq!(
        body["choices"][0]["message"]["content"],
        r#"[{"role":"user","content":"x"}]"#
    );
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));
}

#[tokio::test]
async fn chat_echo_streams_with_local_ids() {
    let (status, body) = post_sse(
        echo_router(),
        "/v1/chat/completions",
        json!({"model": "m", "stream": true, "messages": [{"role": "user", "content": "x"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let payloads: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect();

    assert_eq!(payloads.last(), Some(&"[DONE]"));

    let chunk: Value = serde_json::from_str(payloads[0]).unwrap();
    assert!(chunk["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert_eq!(
        chunk["choices"][0]["delta"]["content"],
        r#"[{"role":"user","content":"x"}]"#
    );
}

#[tokio::test]
async fn anthropic_echo_round_trip() {
    let (status, body) = post_json(
        echo_router(),
        "/v1/messages",
        json!({
            "model": "m",
            "max_tokens": 32,
            "messages": [{"role": "user", "content": "ping"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "message");
    assert_eq!(body["role"], "assistant");
    assert_eq!(body["stop_reason"], "end_turn");
    assert!(body["id"].as_str().unwrap().starts_with("msg_"));

    let text = body["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("ping"));
}

#[tokio::test]
async fn anthropic_echo_streams_a_valid_event_sequence() {
    let (status, body) = post_sse(
        echo_router(),
        "/v1/messages",
        json!({
            "model": "m",
            "max_tokens": 32,
            "stream": true,
            "messages": [{"role": "user", "content": "ping"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect();

    assert_eq!(
        names,
        vec![
            "message_start",
            "content_block_start",
            "content_block_delta",
            "content_block_stop",
            "message_delta",
            "message_stop",
        ]
    );

    let first_payload: Value = body
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .unwrap();

    assert_eq!(first_payload["type"], "message_start");
    assert_eq!(first_payload["message"]["model"], "m");
}

#[tokio::test]
async fn anthropic_missing_max_tokens_is_rejected_in_its_own_dialect() {
    let (status, body) = post_json(
        echo_router(),
        "/v1/messages",
        json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "Invalid request: max_tokens is required");
}

#[tokio::test]
async fn chat_missing_model_is_rejected() {
    let (status, body) = post_json(
        echo_router(),
        "/v1/chat/completions",
        json!({"messages": [{"role": "user", "content": "x"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "Invalid request: model is required");
}

#[tokio::test]
async fn chat_missing_messages_is_rejected() {
    let (status, body) = post_json(echo_router(), "/v1/chat/completions", json!({"model": "m"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "Invalid request: messages is required");
}

#[tokio::test]
async fn responses_missing_model_is_rejected() {
    let (status, body) = post_json(echo_router(), "/v1/responses", json!({"input": "hi"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "Invalid request: model is required");
}

#[tokio::test]
async fn models_listing_comes_from_the_configured_list() {
    let config = config::Config::load(|name| match name {
        "MODELS" => Some("alpha,beta".to_string()),
        "SERVICE_NAME" => Some("relay".to_string()),
        _ => None,
    })
    .unwrap();

    let response = llm::router(&config)
        .oneshot(Request::builder().uri("/v1/models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "alpha");
    assert_eq!(body["data"][1]["id"], "beta");
    assert_eq!(body["data"][0]["object"], "model");
    assert_eq!(body["data"][0]["owned_by"], "relay");
}
