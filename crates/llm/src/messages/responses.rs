//! OpenAI Responses API wire types.
//!
//! The Responses dialect replaces `messages` with a polymorphic `input`
//! field (a string, an array of typed items, or anything else) and returns a
//! structured `output` array. `input` is kept as raw JSON here; the
//! translation layer dispatches on the item shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::openai::Usage;

/// Request body for the Responses API.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesRequest {
    /// The model to use.
    pub model: String,

    /// The conversation input: a string, an array of items, or any other
    /// JSON value (stringified into a user message).
    #[serde(default)]
    pub input: Option<Value>,

    /// System instructions, prepended as a system message.
    #[serde(default)]
    pub instructions: Option<String>,

    /// Output text configuration, carries the requested format.
    #[serde(default)]
    pub text: Option<TextConfig>,

    /// Controls randomness in the response.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    #[serde(default)]
    pub top_p: Option<f32>,

    /// Maximum number of tokens to generate.
    #[serde(default)]
    pub max_output_tokens: Option<u32>,

    /// Whether the model may emit several tool calls in one turn.
    #[serde(default)]
    pub parallel_tool_calls: Option<bool>,

    /// Whether the response should be stored by the provider. Echoed back.
    #[serde(default)]
    pub store: Option<bool>,

    /// Identifier of a previous response. Echoed back.
    #[serde(default)]
    pub previous_response_id: Option<String>,

    /// Free-form metadata. Echoed back.
    #[serde(default)]
    pub metadata: Option<Value>,

    /// Tools in the Responses dialect's flattened function shape.
    #[serde(default)]
    pub tools: Option<Vec<ResponsesTool>>,

    /// Tool choice, echoed back and translated when function-shaped.
    #[serde(default)]
    pub tool_choice: Option<Value>,

    /// Accepted for compatibility; output is always buffered.
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Output text configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextConfig {
    /// Requested output format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
}

/// Requested output format inside `text`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextFormat {
    /// `text`, `json_object` or `json_schema`.
    pub r#type: String,

    /// Schema name, `json_schema` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the schema is enforced strictly, `json_schema` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    /// The schema itself, `json_schema` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// A tool definition in the Responses dialect: the function fields sit
/// directly on the tool object instead of under a `function` wrapper.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResponsesTool {
    /// Tool type, only `function` is translated.
    pub r#type: String,

    /// Function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameters as a JSON Schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Response envelope for the Responses API.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    /// Unique identifier, `resp-` prefixed.
    pub id: String,

    /// Always `response`.
    pub object: String,

    /// Unix timestamp of creation.
    pub created_at: u64,

    /// Always `completed`; the proxy only returns finished responses.
    pub status: String,

    /// Always `null`.
    pub error: Option<Value>,

    /// Always `null`.
    pub incomplete_details: Option<Value>,

    /// Instructions echoed from the request.
    pub instructions: Option<String>,

    /// Token limit echoed from the request.
    pub max_output_tokens: Option<u32>,

    /// Model that produced the response.
    pub model: String,

    /// Ordered output items: one message, then one item per tool call.
    pub output: Vec<OutputItem>,

    /// Echoed from the request, defaults to `true`.
    pub parallel_tool_calls: bool,

    /// Echoed from the request.
    pub previous_response_id: Option<String>,

    /// Reasoning settings, unused by the proxy.
    pub reasoning: Reasoning,

    /// Echoed from the request, defaults to `true`.
    pub store: bool,

    /// Echoed from the request, defaults to `1`.
    pub temperature: f32,

    /// Text configuration echoed from the request.
    pub text: TextConfig,

    /// Echoed from the request, defaults to `"auto"`.
    pub tool_choice: Value,

    /// Echoed from the request, defaults to `[]`.
    pub tools: Value,

    /// Echoed from the request, defaults to `1`.
    pub top_p: f32,

    /// Always `disabled`.
    pub truncation: String,

    /// Token usage, `null` when the upstream did not report any.
    pub usage: Option<ResponsesUsage>,

    /// Always `null`.
    pub user: Option<Value>,

    /// Echoed from the request, defaults to `{}`.
    pub metadata: Value,

    /// Convenience mirror of the first output message's text.
    pub output_text: String,
}

/// Reasoning settings echoed in the envelope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reasoning {
    /// Always `null`.
    pub effort: Option<Value>,

    /// Always `null`.
    pub summary: Option<Value>,
}

/// One item in the `output` array.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// The assistant message.
    Message {
        /// Unique identifier, `msg-` prefixed.
        id: String,
        /// Always `completed`.
        status: String,
        /// Always `assistant`.
        role: String,
        /// Text parts; empty when the assistant produced no text.
        content: Vec<OutputContent>,
    },

    /// A function call requested by the model.
    FunctionCall {
        /// Tool call identifier.
        call_id: String,
        /// Function name.
        name: String,
        /// JSON-encoded arguments, verbatim.
        arguments: String,
    },
}

/// One content part of an output message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    /// A text part.
    OutputText {
        /// The text.
        text: String,
        /// Always empty.
        annotations: Vec<Value>,
    },
}

/// Token usage in the Responses dialect.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResponsesUsage {
    /// Input tokens.
    pub input_tokens: u32,

    /// Output tokens.
    pub output_tokens: u32,

    /// Total tokens.
    pub total_tokens: u32,
}

impl From<Usage> for ResponsesUsage {
    fn from(usage: Usage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}
