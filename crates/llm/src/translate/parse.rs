//! Body-level validation for the three dialect endpoints.
//!
//! Handlers receive the body as raw JSON and run it through these parsers,
//! so a missing `model` (or `messages`, or Anthropic's `max_tokens`)
//! answers as an invalid-request error in the caller's dialect instead of a
//! bare extractor rejection.

use serde_json::Value;

use crate::{
    error::{LlmError, LlmResult},
    messages::{anthropic::AnthropicChatRequest, openai::ChatCompletionRequest, responses::ResponsesRequest},
};

pub(crate) fn parse_chat(body: Value) -> LlmResult<ChatCompletionRequest> {
    require(&body, &["model", "messages"])?;
    deserialize(body)
}

pub(crate) fn parse_responses(body: Value) -> LlmResult<ResponsesRequest> {
    require(&body, &["model"])?;
    deserialize(body)
}

pub(crate) fn parse_anthropic(body: Value) -> LlmResult<AnthropicChatRequest> {
    require(&body, &["model", "messages", "max_tokens"])?;
    deserialize(body)
}

/// Missing and `null` fields are reported by name, in order.
fn require(body: &Value, fields: &[&str]) -> LlmResult<()> {
    for field in fields {
        if body.get(field).is_none_or(Value::is_null) {
            return Err(LlmError::InvalidRequest(format!("{field} is required")));
        }
    }

    Ok(())
}

/// Everything else a body can get wrong (types, enum tags) surfaces with
/// the deserializer's own message.
fn deserialize<T: serde::de::DeserializeOwned>(body: Value) -> LlmResult<T> {
    serde_json::from_value(body).map_err(|error| LlmError::InvalidRequest(error.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_model_is_reported_by_name() {
        let error = parse_chat(json!({"messages": [{"role": "user", "content": "hi"}]})).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid request: model is required");
    }

    #[test]
    fn null_messages_count_as_missing() {
        let error = parse_chat(json!({"model": "m", "messages": null})).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid request: messages is required");
    }

    #[test]
    fn responses_require_a_model() {
        let error = parse_responses(json!({"input": "hi"})).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid request: model is required");
    }

    #[test]
    fn anthropic_requires_max_tokens() {
        let error = parse_anthropic(json!({
            "model": "m",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid request: max_tokens is required");
    }

    #[test]
    fn wrongly_typed_fields_become_invalid_request() {
        let error = parse_chat(json!({"model": "m", "messages": "not-an-array"})).unwrap_err();
        assert!(matches!(error, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn non_object_bodies_fail_on_the_first_required_field() {
        let error = parse_chat(json!(["not", "an", "object"])).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Invalid request: model is required");
    }

    #[test]
    fn valid_bodies_deserialize() {
        let request = parse_anthropic(json!({
            "model": "m",
            "max_tokens": 16,
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();

        assert_eq!(request.model, "m");
        assert_eq!(request.max_tokens, 16);
    }
}
