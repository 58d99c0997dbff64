//! Assembled result → buffered Chat Completions envelope.

use uuid::Uuid;

use crate::{
    assemble::CompletionOutcome,
    messages::openai::{ChatChoice, ChatCompletionResponse, ChatMessage, ChatRole, FinishReason, ObjectType},
    translate::now_seconds,
};

pub(crate) fn chat_completion_response(outcome: CompletionOutcome) -> ChatCompletionResponse {
    let message = ChatMessage {
        role: ChatRole::Assistant,
        content: Some(outcome.assistant_text),
        reasoning_content: (!outcome.reasoning_text.is_empty()).then_some(outcome.reasoning_text),
        tool_calls: (!outcome.tool_calls.is_empty()).then_some(outcome.tool_calls),
        tool_call_id: None,
    };

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: ObjectType::ChatCompletion,
        created: now_seconds(),
        model: outcome.model,
        choices: vec![ChatChoice {
            index: 0,
            message,
            finish_reason: Some(outcome.finish_reason.unwrap_or(FinishReason::Stop)),
        }],
        usage: outcome.usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::openai::{FunctionCall, ToolCall, ToolCallType, Usage};

    #[test]
    fn envelope_carries_text_and_defaults_finish_reason() {
        let mut outcome = CompletionOutcome::new("m".to_string());
        outcome.assistant_text = "hello".to_string();

        let response = chat_completion_response(outcome);

        assert!(response.id.starts_with("chatcmpl-"));
        assert_eq!(response.object, ObjectType::ChatCompletion);
        assert_eq!(response.model, "m");
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hello"));
        assert_eq!(response.choices[0].finish_reason, Some(FinishReason::Stop));
        assert!(response.usage.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["object"], "chat.completion");
        assert!(json["usage"].is_null());
        assert!(json["choices"][0]["message"].get("reasoning_content").is_none());
    }

    #[test]
    fn reasoning_and_tool_calls_are_attached_when_present() {
        let mut outcome = CompletionOutcome::new("m".to_string());
        outcome.reasoning_text = "thinking".to_string();
        outcome.finish_reason = Some(FinishReason::ToolCalls);
        outcome.tool_calls.push(ToolCall {
            id: "call_1".to_string(),
            call_type: ToolCallType::Function,
            function: FunctionCall {
                name: "add".to_string(),
                arguments: "{}".to_string(),
            },
        });
        outcome.usage = Some(Usage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        });

        let response = chat_completion_response(outcome);
        let message = &response.choices[0].message;

        assert_eq!(message.reasoning_content.as_deref(), Some("thinking"));
        assert_eq!(message.tool_calls.as_ref().unwrap().len(), 1);
        assert_eq!(response.choices[0].finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(response.usage.unwrap().total_tokens, 3);
    }
}
