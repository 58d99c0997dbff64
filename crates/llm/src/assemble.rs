//! Incremental assembly of one chat completion from an upstream SSE stream.

use futures::StreamExt;
use serde_json::json;

use crate::{
    error::LlmResult,
    messages::openai::{
        ChatCompletionResponse, FinishReason, FunctionCall, StreamChunk, ToolCall, ToolCallType, Usage,
    },
    upstream::SseDataStream,
};

/// Everything one upstream completion produced, buffered or streamed.
#[derive(Debug, Clone)]
pub(crate) struct CompletionOutcome {
    /// Concatenation of all text deltas in arrival order.
    pub assistant_text: String,

    /// Concatenation of all reasoning deltas, kept separate from the answer.
    pub reasoning_text: String,

    /// Assembled tool calls, dense and in upstream index order.
    pub tool_calls: Vec<ToolCall>,

    /// Model reported by the last upstream event that carried one, falling
    /// back to the caller-requested model.
    pub model: String,

    /// Usage reported by the last upstream event that carried one.
    pub usage: Option<Usage>,

    /// Finish reason from the final chunk, when the upstream sent one.
    pub finish_reason: Option<FinishReason>,
}

impl CompletionOutcome {
    pub(crate) fn new(model: String) -> Self {
        Self {
            assistant_text: String::new(),
            reasoning_text: String::new(),
            tool_calls: Vec::new(),
            model,
            usage: None,
            finish_reason: None,
        }
    }

    /// Extracts the same shape from a buffered Chat Completions body.
    pub(crate) fn from_chat_response(response: ChatCompletionResponse, fallback_model: String) -> Self {
        let mut outcome = Self::new(fallback_model);

        if !response.model.is_empty() {
            outcome.model = response.model;
        }
        outcome.usage = response.usage;

        if let Some(choice) = response.choices.into_iter().next() {
            outcome.finish_reason = choice.finish_reason;
            outcome.assistant_text = choice.message.content.unwrap_or_default();
            outcome.reasoning_text = choice.message.reasoning_content.unwrap_or_default();
            outcome.tool_calls = choice.message.tool_calls.unwrap_or_default();
        }

        outcome
    }

    /// Re-publishes the outcome as a minimal chunk stream.
    ///
    /// Used by echo mode and as the fallback when an upstream answers a
    /// `stream=true` request with a buffered body: both then flow through
    /// the exact same streaming paths as a live upstream.
    pub(crate) fn to_sse_payloads(&self) -> Vec<String> {
        let mut delta = json!({
            "role": "assistant",
            "content": self.assistant_text,
        });

        if !self.reasoning_text.is_empty() {
            delta["reasoning_content"] = json!(self.reasoning_text);
        }

        if !self.tool_calls.is_empty() {
            let calls: Vec<_> = self
                .tool_calls
                .iter()
                .enumerate()
                .map(|(index, call)| {
                    json!({
                        "index": index,
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.function.name,
                            "arguments": call.function.arguments,
                        },
                    })
                })
                .collect();
            delta["tool_calls"] = json!(calls);
        }

        let finish_reason = match &self.finish_reason {
            Some(reason) => json!(reason),
            None if self.tool_calls.is_empty() => json!(FinishReason::Stop),
            None => json!(FinishReason::ToolCalls),
        };

        let chunk = json!({
            "model": self.model,
            "choices": [{
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason,
            }],
            "usage": self.usage,
        });

        vec![chunk.to_string(), "[DONE]".to_string()]
    }
}

/// Drains an upstream SSE data stream into a single [`CompletionOutcome`].
///
/// Per payload: `[DONE]` ends assembly, unparseable lines are skipped,
/// full `message` objects short-circuit, deltas accumulate. A stream that
/// ends without `[DONE]` still yields whatever accumulated. Transport
/// errors propagate.
pub(crate) async fn collect(mut events: SseDataStream, model: String) -> LlmResult<CompletionOutcome> {
    let mut outcome = CompletionOutcome::new(model);
    let mut slots: Vec<Option<ToolCall>> = Vec::new();

    while let Some(item) = events.next().await {
        let data = item?;

        if data == "[DONE]" {
            break;
        }

        let chunk = match sonic_rs::from_str::<StreamChunk>(&data) {
            Ok(chunk) => chunk,
            Err(error) => {
                log::warn!("Skipping unparseable upstream SSE payload: {error}");
                continue;
            }
        };

        if let Some(model) = chunk.model.filter(|m| !m.is_empty()) {
            outcome.model = model;
        }

        if let Some(usage) = chunk.usage {
            outcome.usage = Some(usage);
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            continue;
        };

        if let Some(finish_reason) = choice.finish_reason {
            outcome.finish_reason = Some(finish_reason);
        }

        // Some providers send one full message object instead of deltas.
        if let Some(message) = choice.message
            && let Some(content) = message.content
        {
            outcome.assistant_text = content;

            if let Some(reasoning) = message.reasoning_content {
                outcome.reasoning_text = reasoning;
            }

            if let Some(tool_calls) = message.tool_calls {
                outcome.tool_calls = tool_calls;
                return Ok(outcome);
            }

            continue;
        }

        let Some(delta) = choice.delta else {
            continue;
        };

        if let Some(content) = delta.content {
            outcome.assistant_text.push_str(&content);
        }

        if let Some(text) = delta.text {
            outcome.assistant_text.push_str(&text);
        }

        if let Some(reasoning) = delta.reasoning_content {
            outcome.reasoning_text.push_str(&reasoning);
        }

        for partial in delta.tool_calls.unwrap_or_default() {
            let index = partial.index.unwrap_or(0);

            if slots.len() <= index {
                slots.resize(index + 1, None);
            }

            let slot = slots[index].get_or_insert_with(|| ToolCall {
                id: partial.id.clone().unwrap_or_default(),
                call_type: ToolCallType::Function,
                function: FunctionCall {
                    name: partial
                        .function
                        .as_ref()
                        .and_then(|f| f.name.clone())
                        .unwrap_or_default(),
                    arguments: String::new(),
                },
            });

            if let Some(arguments) = partial.function.as_ref().and_then(|f| f.arguments.as_deref()) {
                slot.function.arguments.push_str(arguments);
            }
        }
    }

    outcome.tool_calls = slots.into_iter().flatten().collect();

    Ok(outcome)
}
