//! Assembled result → Responses API envelope.

use serde_json::json;
use uuid::Uuid;

use crate::{
    assemble::CompletionOutcome,
    json_recovery::recover_json,
    messages::responses::{
        OutputContent, OutputItem, Reasoning, ResponseEnvelope, ResponsesRequest, TextConfig, TextFormat,
    },
    translate::now_seconds,
};

pub(crate) fn response_envelope(request: &ResponsesRequest, outcome: CompletionOutcome) -> ResponseEnvelope {
    let mut output_text = outcome.assistant_text;

    // A caller that asked for json_object gets the embedded JSON value in
    // canonical form when one can be recovered from the prose.
    if requested_json_object(request)
        && let Some(value) = recover_json(&output_text)
    {
        output_text = value.to_string();
    }

    let mut message_content = Vec::new();
    if !output_text.is_empty() {
        message_content.push(OutputContent::OutputText {
            text: output_text.clone(),
            annotations: Vec::new(),
        });
    }

    let mut output = vec![OutputItem::Message {
        id: format!("msg-{}", Uuid::new_v4()),
        status: "completed".to_string(),
        role: "assistant".to_string(),
        content: message_content,
    }];

    for call in outcome.tool_calls {
        output.push(OutputItem::FunctionCall {
            call_id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        });
    }

    ResponseEnvelope {
        id: format!("resp-{}", Uuid::new_v4()),
        object: "response".to_string(),
        created_at: now_seconds(),
        status: "completed".to_string(),
        error: None,
        incomplete_details: None,
        instructions: request.instructions.clone(),
        max_output_tokens: request.max_output_tokens,
        model: outcome.model,
        output,
        parallel_tool_calls: request.parallel_tool_calls.unwrap_or(true),
        previous_response_id: request.previous_response_id.clone(),
        reasoning: Reasoning::default(),
        store: request.store.unwrap_or(true),
        temperature: request.temperature.unwrap_or(1.0),
        text: request.text.clone().unwrap_or_else(default_text_config),
        tool_choice: request.tool_choice.clone().unwrap_or_else(|| json!("auto")),
        tools: request
            .tools
            .as_ref()
            .and_then(|tools| serde_json::to_value(tools).ok())
            .unwrap_or_else(|| json!([])),
        top_p: request.top_p.unwrap_or(1.0),
        truncation: "disabled".to_string(),
        usage: outcome.usage.map(Into::into),
        user: None,
        metadata: request.metadata.clone().unwrap_or_else(|| json!({})),
        output_text,
    }
}

fn requested_json_object(request: &ResponsesRequest) -> bool {
    request
        .text
        .as_ref()
        .and_then(|text| text.format.as_ref())
        .is_some_and(|format| format.r#type == "json_object")
}

fn default_text_config() -> TextConfig {
    TextConfig {
        format: Some(TextFormat {
            r#type: "text".to_string(),
            name: None,
            strict: None,
            schema: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::messages::openai::{FinishReason, FunctionCall, ToolCall, ToolCallType, Usage};

    fn request(body: Value) -> ResponsesRequest {
        serde_json::from_value(body).unwrap()
    }

    fn outcome_with_text(text: &str) -> CompletionOutcome {
        let mut outcome = CompletionOutcome::new("m".to_string());
        outcome.assistant_text = text.to_string();
        outcome.finish_reason = Some(FinishReason::Stop);
        outcome
    }

    #[test]
    fn output_text_mirrors_the_first_message_part() {
        let envelope = response_envelope(&request(json!({"model": "m", "input": "hi"})), outcome_with_text("hi"));

        assert!(envelope.id.starts_with("resp-"));
        assert_eq!(envelope.output_text, "hi");

        let OutputItem::Message { content, .. } = &envelope.output[0] else {
            unreachable!("expected a message item");
        };
        let OutputContent::OutputText { text, .. } = &content[0];
        assert_eq!(text, &envelope.output_text);
    }

    #[test]
    fn empty_text_omits_the_output_text_part() {
        let envelope = response_envelope(&request(json!({"model": "m", "input": "hi"})), outcome_with_text(""));

        let OutputItem::Message { content, .. } = &envelope.output[0] else {
            unreachable!("expected a message item");
        };
        assert!(content.is_empty());
        assert_eq!(envelope.output_text, "");
    }

    #[test]
    fn tool_calls_follow_the_message_in_order() {
        let mut outcome = outcome_with_text("working on it");
        for id in ["call_1", "call_2"] {
            outcome.tool_calls.push(ToolCall {
                id: id.to_string(),
                call_type: ToolCallType::Function,
                function: FunctionCall {
                    name: "f".to_string(),
                    arguments: "{}".to_string(),
                },
            });
        }

        let envelope = response_envelope(&request(json!({"model": "m", "input": "hi"})), outcome);

        assert_eq!(envelope.output.len(), 3);
        let OutputItem::FunctionCall { call_id, .. } = &envelope.output[1] else {
            unreachable!("expected a function_call item");
        };
        assert_eq!(call_id, "call_1");
    }

    #[test]
    fn request_fields_are_echoed_with_defaults() {
        let envelope = response_envelope(&request(json!({"model": "m", "input": "hi"})), outcome_with_text("hi"));

        assert_eq!(envelope.status, "completed");
        assert_eq!(envelope.truncation, "disabled");
        assert!(envelope.parallel_tool_calls);
        assert!(envelope.store);
        assert_eq!(envelope.temperature, 1.0);
        assert_eq!(envelope.top_p, 1.0);
        assert_eq!(envelope.tool_choice, json!("auto"));
        assert_eq!(envelope.tools, json!([]));
        assert_eq!(envelope.metadata, json!({}));

        let serialized = serde_json::to_value(&envelope).unwrap();
        assert!(serialized["error"].is_null());
        assert!(serialized["incomplete_details"].is_null());
        assert!(serialized["user"].is_null());
        assert_eq!(serialized["text"]["format"]["type"], "text");
        assert!(serialized["reasoning"]["effort"].is_null());
    }

    #[test]
    fn usage_is_mapped_to_input_output_naming() {
        let mut outcome = outcome_with_text("hi");
        outcome.usage = Some(Usage {
            prompt_tokens: 4,
            completion_tokens: 1,
            total_tokens: 5,
        });

        let envelope = response_envelope(&request(json!({"model": "m", "input": "hi"})), outcome);

        let usage = envelope.usage.unwrap();
        assert_eq!(usage.input_tokens, 4);
        assert_eq!(usage.output_tokens, 1);
        assert_eq!(usage.total_tokens, 5);
    }

    #[test]
    fn json_object_requests_get_recovered_json() {
        let req = request(json!({
            "model": "m",
            "input": "hi",
            "text": {"format": {"type": "json_object"}}
        }));

        let envelope = response_envelope(&req, outcome_with_text(r#"sure, here: {"a":1} trailing"#));
        assert_eq!(envelope.output_text, r#"{"a":1}"#);
    }

    #[test]
    fn unrecoverable_text_passes_through_unchanged() {
        let req = request(json!({
            "model": "m",
            "input": "hi",
            "text": {"format": {"type": "json_object"}}
        }));

        let envelope = response_envelope(&req, outcome_with_text("no structure here"));
        assert_eq!(envelope.output_text, "no structure here");
    }
}
