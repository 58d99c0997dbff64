//! Responses API → canonical Chat Completions request.
//!
//! The `input` field is the tricky part: a string, an array of typed items,
//! or any other JSON value. Items are dispatched on their `type`, and
//! anything unrecognized degrades to a user message rather than an error.

use serde_json::Value;

use crate::{
    error::{LlmError, LlmResult},
    messages::{
        openai::{
            ChatCompletionRequest, ChatMessage, ChatRole, FunctionCall, FunctionChoice, FunctionDefinition,
            JsonSchemaFormat, ResponseFormat, Tool, ToolCall, ToolCallType, ToolChoice, ToolChoiceMode,
        },
        responses::ResponsesRequest,
    },
};

pub(crate) fn from_responses(request: &ResponsesRequest) -> LlmResult<ChatCompletionRequest> {
    let mut messages = input_messages(request.input.as_ref());

    if messages.is_empty() {
        return Err(LlmError::InvalidRequest("input is required".to_string()));
    }

    if let Some(instructions) = &request.instructions {
        messages.insert(0, ChatMessage::text(ChatRole::System, instructions.clone()));
    }

    let tools = request.tools.as_ref().map(|tools| {
        tools
            .iter()
            .filter(|tool| tool.r#type == "function")
            .filter_map(|tool| {
                Some(Tool {
                    tool_type: "function".to_string(),
                    function: FunctionDefinition {
                        name: tool.name.clone()?,
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
            })
            .collect::<Vec<_>>()
    });

    Ok(ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        stream: None,
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: request.max_output_tokens,
        parallel_tool_calls: request.parallel_tool_calls,
        stop: None,
        tools: tools.filter(|tools| !tools.is_empty()),
        tool_choice: request.tool_choice.as_ref().and_then(tool_choice),
        response_format: request
            .text
            .as_ref()
            .and_then(|text| text.format.as_ref())
            .and_then(response_format),
    })
}

/// Builds canonical messages from the polymorphic `input` value.
fn input_messages(input: Option<&Value>) -> Vec<ChatMessage> {
    match input {
        None => Vec::new(),
        Some(Value::String(text)) => vec![ChatMessage::text(ChatRole::User, text.clone())],
        Some(Value::Array(items)) => items.iter().map(item_message).collect(),
        Some(other) => vec![ChatMessage::text(ChatRole::User, other.to_string())],
    }
}

fn item_message(item: &Value) -> ChatMessage {
    match item.get("type").and_then(Value::as_str) {
        Some("function_call") => ChatMessage {
            role: ChatRole::Assistant,
            content: Some(String::new()),
            reasoning_content: None,
            tool_calls: Some(vec![ToolCall {
                id: field_str(item, "call_id"),
                call_type: ToolCallType::Function,
                function: FunctionCall {
                    name: field_str(item, "name"),
                    arguments: field_str(item, "arguments"),
                },
            }]),
            tool_call_id: None,
        },

        Some("function_call_output") => ChatMessage {
            role: ChatRole::Tool,
            content: Some(item.get("output").map(value_text).unwrap_or_default()),
            reasoning_content: None,
            tool_calls: None,
            tool_call_id: Some(field_str(item, "call_id")),
        },

        item_type => {
            // `message` items and anything carrying a role fold into a plain
            // chat message; everything else becomes user content.
            if item_type == Some("message") || item.get("role").is_some() {
                let role = match item.get("role").and_then(Value::as_str) {
                    Some("system") => ChatRole::System,
                    Some("assistant") => ChatRole::Assistant,
                    Some("tool") => ChatRole::Tool,
                    _ => ChatRole::User,
                };

                ChatMessage::text(role, item.get("content").map(message_text).unwrap_or_default())
            } else {
                let content = item.get("content").unwrap_or(item);
                ChatMessage::text(ChatRole::User, value_text(content))
            }
        }
    }
}

/// Flattens a `message` item's content: strings pass through, part arrays
/// concatenate the text of `input_text`/`text`/`output_text` parts in order.
fn message_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => {
            let mut flattened = String::new();
            for part in parts {
                if matches!(
                    part.get("type").and_then(Value::as_str),
                    Some("input_text" | "text" | "output_text")
                ) && let Some(text) = part.get("text").and_then(Value::as_str)
                {
                    flattened.push_str(text);
                }
            }
            flattened
        }
        other => other.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn field_str(item: &Value, field: &str) -> String {
    item.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn tool_choice(value: &Value) -> Option<ToolChoice> {
    match value {
        Value::String(mode) => match mode.as_str() {
            "none" => Some(ToolChoice::Mode(ToolChoiceMode::None)),
            "auto" => Some(ToolChoice::Mode(ToolChoiceMode::Auto)),
            "required" => Some(ToolChoice::Mode(ToolChoiceMode::Required)),
            _ => None,
        },
        Value::Object(object) if object.get("type").and_then(Value::as_str) == Some("function") => {
            let name = object
                .get("name")
                .or_else(|| object.get("function").and_then(|f| f.get("name")))
                .and_then(Value::as_str)?;

            Some(ToolChoice::Specific {
                choice_type: "function".to_string(),
                function: FunctionChoice { name: name.to_string() },
            })
        }
        _ => None,
    }
}

fn response_format(format: &crate::messages::responses::TextFormat) -> Option<ResponseFormat> {
    match format.r#type.as_str() {
        "json_object" => Some(ResponseFormat::JsonObject),
        "json_schema" => Some(ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: format.name.clone().unwrap_or_else(|| "schema".to_string()),
                strict: format.strict.unwrap_or(true),
                schema: format.schema.clone(),
            },
        }),
        _ => None,
    }
}
