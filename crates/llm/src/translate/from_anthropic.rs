//! Anthropic Messages → canonical Chat Completions request.

use serde_json::Value;

use crate::messages::{
    anthropic::{AnthropicChatRequest, AnthropicContent, AnthropicRole, AnthropicToolChoice},
    openai::{
        ChatCompletionRequest, ChatMessage, ChatRole, FunctionCall, FunctionChoice, FunctionDefinition,
        StopSequences, Tool, ToolCall, ToolCallType, ToolChoice, ToolChoiceMode,
    },
};

pub(crate) fn from_anthropic(request: &AnthropicChatRequest) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(system) = &request.system {
        messages.push(ChatMessage::text(ChatRole::System, system.clone()));
    }

    for message in &request.messages {
        let role = match message.role {
            AnthropicRole::User => ChatRole::User,
            AnthropicRole::Assistant => ChatRole::Assistant,
        };

        for block in &message.content {
            match block {
                AnthropicContent::Text { text } => {
                    messages.push(ChatMessage::text(role.clone(), text.clone()));
                }
                AnthropicContent::ToolUse { id, name, input } => {
                    messages.push(ChatMessage {
                        role: ChatRole::Assistant,
                        content: Some(String::new()),
                        reasoning_content: None,
                        tool_calls: Some(vec![ToolCall {
                            id: id.clone(),
                            call_type: ToolCallType::Function,
                            function: FunctionCall {
                                name: name.clone(),
                                arguments: stringify_input(input),
                            },
                        }]),
                        tool_call_id: None,
                    });
                }
                AnthropicContent::ToolResult { tool_use_id, content } => {
                    messages.push(ChatMessage {
                        role: ChatRole::Tool,
                        content: Some(stringify_input(content)),
                        reasoning_content: None,
                        tool_calls: None,
                        tool_call_id: Some(tool_use_id.clone()),
                    });
                }
            }
        }
    }

    let tools = request.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|tool| Tool {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.input_schema.clone(),
                },
            })
            .collect()
    });

    let tool_choice = request.tool_choice.as_ref().map(|choice| match choice {
        AnthropicToolChoice::Auto => ToolChoice::Mode(ToolChoiceMode::Auto),
        AnthropicToolChoice::Any => ToolChoice::Mode(ToolChoiceMode::Required),
        AnthropicToolChoice::Tool { name } => ToolChoice::Specific {
            choice_type: "function".to_string(),
            function: FunctionChoice { name: name.clone() },
        },
    });

    ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        stream: request.stream,
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: Some(request.max_tokens),
        parallel_tool_calls: None,
        stop: request.stop_sequences.clone().map(StopSequences::Many),
        tools,
        tool_choice,
        response_format: None,
    }
}

/// Tool inputs and results are JSON-stringified unless already a string.
fn stringify_input(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
