//! Echo mode: when no upstream is configured, the proxy answers with the
//! request's own payload as the assistant message. Useful for offline
//! testing of clients and of the dialect translations themselves.

use serde_json::Value;

use crate::{
    assemble::CompletionOutcome,
    messages::openai::{FinishReason, Usage},
};

/// Formats an echoed payload: strings pass through verbatim, anything else
/// is JSON-stringified.
pub(crate) fn payload_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Advisory token estimate: four characters per token, at least one.
///
/// Stringified payloads double-count punctuation; the numbers exist so
/// clients tracking usage see something plausible, nothing more.
pub(crate) fn estimate_tokens(text: &str) -> u32 {
    (text.len() as u32).div_ceil(4).max(1)
}

/// Builds the completion a configured upstream would have produced.
pub(crate) fn outcome(model: String, content: String) -> CompletionOutcome {
    let tokens = estimate_tokens(&content);
    let mut outcome = CompletionOutcome::new(model);

    outcome.usage = Some(Usage {
        prompt_tokens: tokens,
        completion_tokens: tokens,
        total_tokens: tokens * 2,
    });
    outcome.finish_reason = Some(FinishReason::Stop);
    outcome.assistant_text = content;

    outcome
}
