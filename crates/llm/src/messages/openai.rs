//! OpenAI Chat Completions wire types.
//!
//! This is both the upstream protocol and the proxy's canonical request
//! shape. Deserialization is tolerant where providers disagree (array
//! content parts, missing fields in stream chunks); serialization skips
//! unset fields so the upstream sees a minimal request.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for the Chat Completions API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    /// The model to use for the completion.
    pub model: String,

    /// The conversation so far, oldest message first.
    pub messages: Vec<ChatMessage>,

    /// Whether to stream the response as Server-Sent Events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Controls randomness in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum number of tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether the model may emit several tool calls in one turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,

    /// Sequences that halt generation, a single string or a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,

    /// Tools available to the model. Only function tools survive
    /// normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// How the model should use the available tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Requested output format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// One or several stop sequences.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StopSequences {
    /// A single stop sequence.
    One(String),
    /// Several stop sequences.
    Many(Vec<String>),
}

/// A single message in a Chat Completions conversation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: ChatRole,

    /// Text content. Array-of-parts content is flattened to the
    /// concatenation of its `text` parts at parse time.
    #[serde(
        default,
        deserialize_with = "deserialize_flattened_content",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,

    /// Reasoning tokens attached to the assistant message by models that
    /// emit them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,

    /// Tool calls made by the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// ID of the tool call this message answers (role `tool` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// A plain text message with no tool payload.
    pub fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            reasoning_content: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Role of a message sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool execution result.
    Tool,
}

/// A request, emitted by the model, to invoke a named function.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCall {
    /// Unique identifier for this call.
    pub id: String,

    /// Call type, always `function`.
    #[serde(rename = "type", default)]
    pub call_type: ToolCallType,

    /// The function being invoked.
    pub function: FunctionCall,
}

/// Tool call type marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallType {
    /// Function call.
    #[default]
    Function,
}

/// The function part of a tool call.
///
/// `arguments` is an opaque JSON string: it is accumulated verbatim across
/// stream deltas and only ever parsed when a dialect conversion demands it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionCall {
    /// Name of the function to call.
    pub name: String,

    /// JSON-encoded arguments.
    pub arguments: String,
}

/// A tool the model may call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tool {
    /// Tool type. Anything other than `function` is dropped during
    /// normalization.
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition.
    pub function: FunctionDefinition,
}

/// Definition of a callable function.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameters as a JSON Schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// How the model should use tools.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// Mode-based choice: `none`, `auto` or `required`.
    Mode(ToolChoiceMode),

    /// A specific function the model must call.
    Specific {
        /// Always `function`.
        #[serde(rename = "type")]
        choice_type: String,
        /// The function to call.
        function: FunctionChoice,
    },

    /// Legacy flat shape `{type:"function", name:"X"}`, normalized to
    /// [`ToolChoice::Specific`].
    NamedFlat {
        /// Always `function`.
        #[serde(rename = "type")]
        choice_type: String,
        /// The function to call.
        name: String,
    },
}

/// Mode-based tool choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoiceMode {
    /// Don't use any tools.
    None,
    /// Model decides whether to use tools.
    Auto,
    /// Model must use at least one tool.
    Required,
}

/// Named function inside a specific tool choice.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionChoice {
    /// The function name.
    pub name: String,
}

/// Requested output format.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text output.
    Text,
    /// The model must answer with a JSON object.
    JsonObject,
    /// The model must answer matching a JSON schema.
    JsonSchema {
        /// The schema constraint.
        json_schema: JsonSchemaFormat,
    },
}

/// A named JSON schema constraint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonSchemaFormat {
    /// Schema name.
    pub name: String,

    /// Whether the schema is enforced strictly.
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// The schema itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

fn default_strict() -> bool {
    true
}

/// Response envelope for a buffered chat completion.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    /// Unique identifier for this completion.
    #[serde(default)]
    pub id: String,

    /// Always `chat.completion`.
    #[serde(default)]
    pub object: ObjectType,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: u64,

    /// Model that produced the completion.
    #[serde(default)]
    pub model: String,

    /// Completion choices. The proxy only ever produces or consumes the
    /// first one.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    /// Token usage, `null` when the upstream did not report any.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatChoice {
    /// Index of this choice.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ChatMessage,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop point reached.
    Stop,
    /// Maximum token count reached.
    Length,
    /// Content filtered for safety.
    ContentFilter,
    /// The model emitted tool calls.
    ToolCalls,
    /// Any other reason, kept verbatim for forward compatibility.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::ContentFilter => write!(f, "content_filter"),
            FinishReason::ToolCalls => write!(f, "tool_calls"),
            FinishReason::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Usage {
    /// Input/prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Output/completion tokens.
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

/// Object type discriminator used across OpenAI envelopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ObjectType {
    /// A single model.
    #[serde(rename = "model")]
    Model,
    /// A listing.
    #[serde(rename = "list")]
    List,
    /// A buffered chat completion.
    #[default]
    #[serde(rename = "chat.completion")]
    ChatCompletion,
    /// A streamed chat completion chunk.
    #[serde(rename = "chat.completion.chunk")]
    ChatCompletionChunk,
}

/// Response for `GET /v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Always `list`.
    pub object: ObjectType,

    /// Available models.
    pub data: Vec<Model>,
}

/// A single model listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier.
    pub id: String,

    /// Always `model`.
    pub object: ObjectType,

    /// Unix timestamp when the model was created.
    pub created: u64,

    /// Owner of the model.
    pub owned_by: String,
}

/// A single upstream SSE chunk, parsed leniently.
///
/// Providers disagree on the exact shape: some send full `message` objects
/// instead of deltas, some call the text field `text`, some add
/// `reasoning_content`. Every field is optional here; the assembler and the
/// stream projector decide what to do with what is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChunk {
    /// Model name, when the event carries one.
    #[serde(default)]
    pub model: Option<String>,

    /// Usage totals, when the event carries them.
    #[serde(default)]
    pub usage: Option<Usage>,

    /// Incremental choices.
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

/// One choice inside a stream chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamChoice {
    /// Incremental update.
    #[serde(default)]
    pub delta: Option<StreamDelta>,

    /// Full message object, sent by providers that do not stream deltas.
    #[serde(default)]
    pub message: Option<ChatMessage>,

    /// Why generation stopped, on the final chunk.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Incremental message content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    /// Text fragment to append.
    #[serde(default)]
    pub content: Option<String>,

    /// Alternative name some providers use for [`StreamDelta::content`].
    #[serde(default)]
    pub text: Option<String>,

    /// Reasoning/thinking fragment, kept separate from the answer text.
    #[serde(default)]
    pub reasoning_content: Option<String>,

    /// Partial tool calls.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallChunk>>,
}

/// A partial tool call inside a stream delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallChunk {
    /// Slot index this fragment belongs to. Defaults to 0.
    #[serde(default)]
    pub index: Option<usize>,

    /// Call identifier, present on the first fragment.
    #[serde(default)]
    pub id: Option<String>,

    /// Function name and argument fragment.
    #[serde(default)]
    pub function: Option<FunctionChunk>,
}

/// Partial function payload of a streamed tool call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionChunk {
    /// Function name, present on the first fragment.
    #[serde(default)]
    pub name: Option<String>,

    /// Argument fragment to append verbatim.
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Accepts string content, `null`, or an array of content parts.
///
/// Array parts are flattened by concatenating the `text` of parts whose
/// type is `text`, in order, with no separator.
fn deserialize_flattened_content<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct ContentVisitor;

    impl<'de> Visitor<'de> for ContentVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string, null, or an array of content parts")
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

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut flattened = String::new();

            while let Some(part) = seq.next_element::<Value>()? {
                if part.get("type").and_then(Value::as_str) == Some("text")
                    && let Some(text) = part.get("text").and_then(Value::as_str)
                {
                    flattened.push_str(text);
                }
            }

            Ok(Some(flattened))
        }
    }

    deserializer.deserialize_any(ContentVisitor)
}
