//! Anthropic Messages API wire types.
//!
//! The request format differs from Chat Completions in several key ways:
//! - messages carry arrays of typed content blocks,
//! - the system prompt is a separate field,
//! - tool use is expressed as `tool_use`/`tool_result` blocks,
//! - streaming uses `message_*`/`content_block_*` events.
//!
//! Claude clients are not uniform: `content` and `system` may arrive either
//! as plain strings or as block arrays, so both fields get custom
//! deserializers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for the Anthropic Messages API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnthropicChatRequest {
    /// The model to use for the completion.
    pub model: String,

    /// The messages to send to the model.
    pub messages: Vec<AnthropicMessage>,

    /// Maximum number of tokens to generate. Required by the protocol.
    pub max_tokens: u32,

    /// System prompt. A string or an array of text blocks on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "deserialize_system")]
    pub system: Option<String>,

    /// Controls randomness in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Sequences that will cause the model to stop generating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Whether to stream the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Tools available for the model to use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AnthropicTool>>,

    /// Controls how the model uses tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<AnthropicToolChoice>,
}

/// An Anthropic message with role and content blocks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnthropicMessage {
    /// The role of the message sender.
    pub role: AnthropicRole,

    /// Content blocks. A plain string on the wire becomes a single text
    /// block.
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<AnthropicContent>,
}

/// Role of a message sender in Anthropic's API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnthropicRole {
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// Content block in an Anthropic message.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContent {
    /// Plain text content.
    Text {
        /// The text content.
        text: String,
    },

    /// Tool use request from the assistant.
    ToolUse {
        /// Unique identifier for this tool use.
        id: String,
        /// Name of the tool to use.
        name: String,
        /// Input parameters for the tool.
        input: Value,
    },

    /// Result from a tool execution.
    ToolResult {
        /// The tool use ID this result corresponds to.
        tool_use_id: String,
        /// The result payload, a string or arbitrary JSON.
        content: Value,
    },
}

/// Tool definition in Anthropic format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnthropicTool {
    /// The name of the tool.
    pub name: String,

    /// Description of what the tool does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for the tool's input parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Tool choice configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicToolChoice {
    /// Let the model decide whether to use tools.
    Auto,

    /// Force the model to use any available tool.
    Any,

    /// Force the model to use a specific tool.
    Tool {
        /// The name of the tool to use.
        name: String,
    },
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicChatResponse {
    /// Unique identifier for this completion.
    pub id: String,

    /// Always `message`.
    pub r#type: String,

    /// Always `assistant`.
    pub role: AnthropicRole,

    /// The content of the response.
    pub content: Vec<AnthropicContent>,

    /// The model that generated the response.
    pub model: String,

    /// Why the model stopped generating.
    pub stop_reason: Option<AnthropicStopReason>,

    /// Stop sequence that caused the model to stop, if any.
    pub stop_sequence: Option<String>,

    /// Token usage statistics.
    pub usage: AnthropicUsage,
}

/// The reason why the model stopped generating tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AnthropicStopReason {
    /// The model reached a natural stopping point.
    EndTurn,
    /// The generation exceeded the requested token limit.
    MaxTokens,
    /// The model encountered a configured stop sequence.
    StopSequence,
    /// The model invoked a tool.
    ToolUse,
}

impl fmt::Display for AnthropicStopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnthropicStopReason::EndTurn => write!(f, "end_turn"),
            AnthropicStopReason::MaxTokens => write!(f, "max_tokens"),
            AnthropicStopReason::StopSequence => write!(f, "stop_sequence"),
            AnthropicStopReason::ToolUse => write!(f, "tool_use"),
        }
    }
}

/// Token usage statistics in Anthropic format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnthropicUsage {
    /// Number of input tokens.
    #[serde(default)]
    pub input_tokens: u32,

    /// Number of output tokens.
    #[serde(default)]
    pub output_tokens: u32,
}

/// Error envelope in Anthropic format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `error`.
    pub r#type: String,

    /// Error details.
    pub error: ErrorDetails,
}

impl ErrorResponse {
    /// Wraps error details in the outer envelope.
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            r#type: "error".to_string(),
            error: ErrorDetails {
                r#type: error_type.into(),
                message: message.into(),
            },
        }
    }
}

/// Error details in Anthropic format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// The kind of error that occurred.
    pub r#type: String,

    /// Human-readable error message.
    pub message: String,
}

/// Streaming event types for Anthropic SSE responses.
///
/// Event flow for a streaming response: one `message_start`, then balanced
/// `content_block_start`/`content_block_stop` pairs with deltas in between,
/// then `message_delta` and `message_stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicStreamEvent {
    /// Start of a message.
    MessageStart {
        /// The initial message envelope with empty content.
        message: AnthropicStreamMessageStart,
    },

    /// A content block begins.
    ContentBlockStart {
        /// The index of the content block.
        index: u32,
        /// The block being started.
        content_block: AnthropicContent,
    },

    /// Incremental content update.
    ContentBlockDelta {
        /// The index of the content block.
        index: u32,
        /// The delta update.
        delta: AnthropicContentDelta,
    },

    /// A content block is complete.
    ContentBlockStop {
        /// The index of the content block.
        index: u32,
    },

    /// Final message metadata.
    MessageDelta {
        /// Stop reason and sequence.
        delta: AnthropicMessageDelta,
        /// Updated usage statistics.
        usage: AnthropicUsage,
    },

    /// End of the message stream.
    MessageStop,

    /// Keep-alive event.
    Ping,

    /// Error event, the stream ends after it.
    Error {
        /// The error that occurred.
        error: ErrorDetails,
    },
}

impl AnthropicStreamEvent {
    /// SSE event name for this event, sent on the `event:` line.
    pub fn name(&self) -> &'static str {
        match self {
            AnthropicStreamEvent::MessageStart { .. } => "message_start",
            AnthropicStreamEvent::ContentBlockStart { .. } => "content_block_start",
            AnthropicStreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            AnthropicStreamEvent::ContentBlockStop { .. } => "content_block_stop",
            AnthropicStreamEvent::MessageDelta { .. } => "message_delta",
            AnthropicStreamEvent::MessageStop => "message_stop",
            AnthropicStreamEvent::Ping => "ping",
            AnthropicStreamEvent::Error { .. } => "error",
        }
    }
}

/// Initial message envelope inside `message_start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicStreamMessageStart {
    /// Unique message ID.
    pub id: String,

    /// Always `message`.
    pub r#type: String,

    /// Always `assistant`.
    pub role: AnthropicRole,

    /// Empty at the start, filled through content block events.
    pub content: Vec<AnthropicContent>,

    /// The model being used.
    pub model: String,

    /// Initial usage statistics.
    pub usage: AnthropicUsage,
}

/// Delta update for content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentDelta {
    /// Text fragment to append.
    TextDelta {
        /// Additional text content.
        text: String,
    },

    /// Tool input fragment to append.
    InputJsonDelta {
        /// Partial JSON string for tool input.
        partial_json: String,
    },
}

/// Message-level delta inside `message_delta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessageDelta {
    /// Stop reason once the message is complete.
    pub stop_reason: Option<AnthropicStopReason>,

    /// Stop sequence if one was encountered.
    pub stop_sequence: Option<String>,
}

/// Accepts message content as a plain string or an array of blocks.
fn deserialize_content<'de, D>(deserializer: D) -> Result<Vec<AnthropicContent>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct ContentVisitor;

    impl<'de> Visitor<'de> for ContentVisitor {
        type Value = Vec<AnthropicContent>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string or array of content blocks")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![AnthropicContent::Text {
                text: value.to_string(),
            }])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![AnthropicContent::Text { text: value }])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut contents = Vec::new();
            while let Some(content) = seq.next_element::<AnthropicContent>()? {
                contents.push(content);
            }
            Ok(contents)
        }
    }

    deserializer.deserialize_any(ContentVisitor)
}

/// Accepts the system prompt as a plain string or an array of text blocks.
fn deserialize_system<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct SystemVisitor;

    impl<'de> Visitor<'de> for SystemVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string or array of content blocks")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(SystemContentVisitor)
        }
    }

    struct SystemContentVisitor;

    impl<'de> Visitor<'de> for SystemContentVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string or array of content blocks")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut text_parts = Vec::new();

            while let Some(value) = seq.next_element::<Value>()? {
                if let Some(text) = value.get("text").and_then(Value::as_str) {
                    text_parts.push(text.to_string());
                } else if let Some(text) = value.as_str() {
                    text_parts.push(text.to_string());
                }
            }

            if text_parts.is_empty() {
                Ok(None)
            } else {
                Ok(Some(text_parts.join("\n")))
            }
        }
    }

    deserializer.deserialize_option(SystemVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_content_as_string() {
        let json = json!({
            "role": "user",
            "content": "Hello, Claude!"
        });

        let msg: AnthropicMessage = serde_json::from_value(json).unwrap();

        assert_eq!(msg.role, AnthropicRole::User);
        assert_eq!(msg.content.len(), 1);

        let AnthropicContent::Text { text } = &msg.content[0] else {
            unreachable!("expected text content");
        };
        assert_eq!(text, "Hello, Claude!");
    }

    #[test]
    fn deserialize_system_as_block_array() {
        let json = json!({
            "model": "claude-3-5-haiku-latest",
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 16,
            "system": [
                {"type": "text", "text": "You are terse."},
                {"type": "text", "text": "Answer in English."}
            ]
        });

        let request: AnthropicChatRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.system.as_deref(), Some("You are terse.\nAnswer in English."));
    }

    #[test]
    fn missing_max_tokens_is_rejected() {
        let json = json!({
            "model": "claude-3-5-haiku-latest",
            "messages": [{"role": "user", "content": "hi"}]
        });

        let error = serde_json::from_value::<AnthropicChatRequest>(json).unwrap_err();
        assert!(error.to_string().contains("max_tokens"));
    }

    #[test]
    fn deserialize_tool_blocks() {
        let json = json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Checking the weather."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Oslo"}}
            ]
        });

        let msg: AnthropicMessage = serde_json::from_value(json).unwrap();
        assert_eq!(msg.content.len(), 2);

        let AnthropicContent::ToolUse { id, name, input } = &msg.content[1] else {
            unreachable!("expected tool use content");
        };
        assert_eq!(id, "toolu_1");
        assert_eq!(name, "get_weather");
        assert_eq!(input["city"], "Oslo");
    }

    #[test]
    fn deserialize_tool_result_with_string_content() {
        let json = json!({
            "role": "user",
            "content": [
                {"type": "tool_result", "tool_use_id": "toolu_1", "content": "22 degrees"}
            ]
        });

        let msg: AnthropicMessage = serde_json::from_value(json).unwrap();

        let AnthropicContent::ToolResult { tool_use_id, content } = &msg.content[0] else {
            unreachable!("expected tool result content");
        };
        assert_eq!(tool_use_id, "toolu_1");
        assert_eq!(content, &json!("22 degrees"));
    }

    #[test]
    fn serialize_streaming_events() {
        let event = AnthropicStreamEvent::ContentBlockDelta {
            index: 0,
            delta: AnthropicContentDelta::TextDelta {
                text: "Hello".to_string(),
            },
        };

        assert_eq!(event.name(), "content_block_delta");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "content_block_delta");
        assert_eq!(json["delta"]["type"], "text_delta");
        assert_eq!(json["delta"]["text"], "Hello");
    }

    #[test]
    fn serialize_message_delta_keeps_null_stop_sequence() {
        let event = AnthropicStreamEvent::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: Some(AnthropicStopReason::ToolUse),
                stop_sequence: None,
            },
            usage: AnthropicUsage::default(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["delta"]["stop_reason"], "tool_use");
        assert!(json["delta"]["stop_sequence"].is_null());
    }

    #[test]
    fn error_envelope_shape() {
        let response = ErrorResponse::new("authentication_error", "Invalid API key");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["error"]["type"], "authentication_error");
        assert_eq!(json["error"]["message"], "Invalid API key");
    }
}
