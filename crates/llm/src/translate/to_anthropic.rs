//! Assembled result → Anthropic Messages response.

use serde_json::Value;
use uuid::Uuid;

use crate::{
    assemble::CompletionOutcome,
    messages::{
        anthropic::{AnthropicChatResponse, AnthropicContent, AnthropicRole, AnthropicStopReason, AnthropicUsage},
        openai::FinishReason,
    },
};

pub(crate) fn message_response(outcome: CompletionOutcome) -> AnthropicChatResponse {
    let mut content = Vec::new();

    if !outcome.assistant_text.is_empty() {
        content.push(AnthropicContent::Text {
            text: outcome.assistant_text,
        });
    }

    for call in outcome.tool_calls {
        content.push(AnthropicContent::ToolUse {
            id: call.id,
            name: call.function.name,
            // Arguments that fail to parse are forwarded as the raw string
            // rather than dropped.
            input: serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments)),
        });
    }

    AnthropicChatResponse {
        id: format!("msg_{}", Uuid::new_v4()),
        r#type: "message".to_string(),
        role: AnthropicRole::Assistant,
        content,
        model: outcome.model,
        stop_reason: Some(stop_reason(outcome.finish_reason.as_ref())),
        stop_sequence: None,
        usage: outcome
            .usage
            .map(|usage| AnthropicUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            })
            .unwrap_or_default(),
    }
}

pub(crate) fn stop_reason(finish_reason: Option<&FinishReason>) -> AnthropicStopReason {
    match finish_reason {
        Some(FinishReason::Length) => AnthropicStopReason::MaxTokens,
        Some(FinishReason::ToolCalls) => AnthropicStopReason::ToolUse,
        _ => AnthropicStopReason::EndTurn,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::messages::openai::{FunctionCall, ToolCall, ToolCallType, Usage};

    #[test]
    fn text_then_tool_use_blocks_in_order() {
        let mut outcome = CompletionOutcome::new("m".to_string());
        outcome.assistant_text = "checking".to_string();
        outcome.finish_reason = Some(FinishReason::ToolCalls);
        outcome.usage = Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        });
        outcome.tool_calls.push(ToolCall {
            id: "call_1".to_string(),
            call_type: ToolCallType::Function,
            function: FunctionCall {
                name: "get_weather".to_string(),
                arguments: r#"{"city":"Oslo"}"#.to_string(),
            },
        });

        let response = message_response(outcome);

        assert!(response.id.starts_with("msg_"));
        assert_eq!(response.r#type, "message");
        assert_eq!(response.content.len(), 2);
        assert_eq!(response.stop_reason, Some(AnthropicStopReason::ToolUse));
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 20);

        let AnthropicContent::ToolUse { id, name, input } = &response.content[1] else {
            unreachable!("expected a tool_use block");
        };
        assert_eq!(id, "call_1");
        assert_eq!(name, "get_weather");
        assert_eq!(input, &json!({"city": "Oslo"}));
    }

    #[test]
    fn empty_text_produces_no_text_block() {
        let outcome = CompletionOutcome::new("m".to_string());
        let response = message_response(outcome);

        assert!(response.content.is_empty());
        assert_eq!(response.stop_reason, Some(AnthropicStopReason::EndTurn));
        assert_eq!(response.usage.input_tokens, 0);
    }

    #[test]
    fn unparseable_arguments_fall_back_to_the_raw_string() {
        let mut outcome = CompletionOutcome::new("m".to_string());
        outcome.tool_calls.push(ToolCall {
            id: "call_1".to_string(),
            call_type: ToolCallType::Function,
            function: FunctionCall {
                name: "f".to_string(),
                arguments: "{broken".to_string(),
            },
        });

        let response = message_response(outcome);

        let AnthropicContent::ToolUse { input, .. } = &response.content[0] else {
            unreachable!("expected a tool_use block");
        };
        assert_eq!(input, &json!("{broken"));
    }

    #[test]
    fn length_maps_to_max_tokens() {
        assert_eq!(stop_reason(Some(&FinishReason::Length)), AnthropicStopReason::MaxTokens);
        assert_eq!(stop_reason(Some(&FinishReason::Stop)), AnthropicStopReason::EndTurn);
        assert_eq!(
            stop_reason(Some(&FinishReason::Other("pause".to_string()))),
            AnthropicStopReason::EndTurn
        );
        assert_eq!(stop_reason(None), AnthropicStopReason::EndTurn);
    }
}
