//! Dialect translation.
//!
//! Inbound requests in any dialect are normalized into the canonical Chat
//! Completions request; the assembled upstream result is built back into the
//! dialect the caller asked for. Each direction is a pure function over the
//! wire types.

mod from_anthropic;
mod from_responses;
mod normalize;
mod parse;
mod to_anthropic;
mod to_openai;
mod to_responses;

pub(crate) use from_anthropic::from_anthropic;
pub(crate) use from_responses::from_responses;
pub(crate) use normalize::normalize;
pub(crate) use parse::{parse_anthropic, parse_chat, parse_responses};
pub(crate) use to_anthropic::message_response;
pub(crate) use to_openai::chat_completion_response;
pub(crate) use to_responses::response_envelope;

/// Seconds since the Unix epoch, for `created` timestamps.
pub(crate) fn now_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
