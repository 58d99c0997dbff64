//! Message types for the three supported LLM protocols.
//!
//! The OpenAI Chat Completions format doubles as the canonical interchange
//! format: both other dialects are normalized into it before a request
//! touches the upstream, and built back from the assembled result.

pub(crate) mod anthropic;
pub(crate) mod openai;
pub(crate) mod responses;
