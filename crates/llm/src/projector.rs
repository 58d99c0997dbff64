//! State machine projecting an upstream Chat Completions SSE stream into an
//! Anthropic Messages event stream, while the upstream is still open.
//!
//! Anthropic's streaming format is stricter than OpenAI's: every content
//! block must be opened, updated and closed at a fixed index, with one
//! `message_start` before and `message_delta`/`message_stop` after. The
//! projector tracks which blocks are open so the emitted sequence is always
//! balanced: the text block lives at index 0, tool blocks at their upstream
//! index + 1, and the text block closes before the first tool block opens.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use crate::messages::{
    anthropic::{
        AnthropicContent, AnthropicContentDelta, AnthropicMessageDelta, AnthropicRole, AnthropicStopReason,
        AnthropicStreamEvent, AnthropicStreamMessageStart, AnthropicUsage,
    },
    openai::{FinishReason, StreamChunk, Usage},
};

pub(crate) struct AnthropicStreamProjector {
    message_id: String,
    model: String,
    sent_message_start: bool,
    text_block_open: bool,
    text_block_closed: bool,
    /// Open tool blocks keyed by upstream tool-call index.
    tool_blocks: BTreeMap<usize, ToolBlock>,
    closed_tool_blocks: BTreeSet<usize>,
    usage: Option<Usage>,
    finished: bool,
}

struct ToolBlock {
    arguments: String,
}

impl AnthropicStreamProjector {
    pub(crate) fn new(message_id: String, model: String) -> Self {
        Self {
            message_id,
            model,
            sent_message_start: false,
            text_block_open: false,
            text_block_closed: false,
            tool_blocks: BTreeMap::new(),
            closed_tool_blocks: BTreeSet::new(),
            usage: None,
            finished: false,
        }
    }

    /// Feeds one upstream chunk through the state machine.
    ///
    /// Returns the Anthropic events to publish downstream, in order. An
    /// upstream chunk can expand into several events (block boundaries) or
    /// none at all.
    pub(crate) fn process_chunk(&mut self, chunk: &StreamChunk) -> Vec<AnthropicStreamEvent> {
        if self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();

        if let Some(model) = chunk.model.as_ref().filter(|m| !m.is_empty()) {
            self.model = model.clone();
        }

        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }

        if !self.sent_message_start {
            events.push(self.message_start());
        }

        let Some(choice) = chunk.choices.first() else {
            return events;
        };

        if let Some(delta) = &choice.delta {
            // Reasoning tokens are published as ordinary text: downstream
            // Anthropic clients have no separate channel for them.
            for text in [&delta.content, &delta.text, &delta.reasoning_content]
                .into_iter()
                .flatten()
            {
                self.text_delta(text, &mut events);
            }

            for partial in delta.tool_calls.iter().flatten() {
                let index = partial.index.unwrap_or(0);

                if !self.tool_blocks.contains_key(&index) && !self.closed_tool_blocks.contains(&index) {
                    self.close_text_block(&mut events);

                    events.push(AnthropicStreamEvent::ContentBlockStart {
                        index: block_index(index),
                        content_block: AnthropicContent::ToolUse {
                            id: partial.id.clone().unwrap_or_default(),
                            name: partial
                                .function
                                .as_ref()
                                .and_then(|f| f.name.clone())
                                .unwrap_or_default(),
                            input: json!({}),
                        },
                    });

                    self.tool_blocks.insert(
                        index,
                        ToolBlock {
                            arguments: String::new(),
                        },
                    );
                }

                if let Some(fragment) = partial.function.as_ref().and_then(|f| f.arguments.as_deref())
                    && let Some(block) = self.tool_blocks.get_mut(&index)
                {
                    block.arguments.push_str(fragment);

                    events.push(AnthropicStreamEvent::ContentBlockDelta {
                        index: block_index(index),
                        delta: AnthropicContentDelta::InputJsonDelta {
                            partial_json: fragment.to_string(),
                        },
                    });
                }
            }
        }

        if let Some(finish_reason) = &choice.finish_reason {
            self.close_message(map_stop_reason(Some(finish_reason)), &mut events);
        }

        events
    }

    /// Closes the stream after upstream EOF.
    ///
    /// A well-behaved upstream finishes with a `finish_reason` first, making
    /// this a no-op. Otherwise the message is closed as a natural end of
    /// turn so downstream always sees a complete sequence.
    pub(crate) fn finish(&mut self) -> Vec<AnthropicStreamEvent> {
        if self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();

        if !self.sent_message_start {
            events.push(self.message_start());
        }

        self.close_message(AnthropicStopReason::EndTurn, &mut events);

        events
    }

    fn message_start(&mut self) -> AnthropicStreamEvent {
        self.sent_message_start = true;

        AnthropicStreamEvent::MessageStart {
            message: AnthropicStreamMessageStart {
                id: self.message_id.clone(),
                r#type: "message".to_string(),
                role: AnthropicRole::Assistant,
                content: Vec::new(),
                model: self.model.clone(),
                usage: AnthropicUsage::default(),
            },
        }
    }

    fn text_delta(&mut self, text: &str, events: &mut Vec<AnthropicStreamEvent>) {
        // A reopened index 0 would unbalance the sequence, so text arriving
        // after a tool call started is dropped.
        if self.text_block_closed {
            if !text.is_empty() {
                log::debug!("Dropping {} bytes of text arriving after the text block closed", text.len());
            }
            return;
        }

        if !self.text_block_open {
            events.push(AnthropicStreamEvent::ContentBlockStart {
                index: 0,
                content_block: AnthropicContent::Text { text: String::new() },
            });
            self.text_block_open = true;
        }

        if !text.is_empty() {
            events.push(AnthropicStreamEvent::ContentBlockDelta {
                index: 0,
                delta: AnthropicContentDelta::TextDelta { text: text.to_string() },
            });
        }
    }

    fn close_text_block(&mut self, events: &mut Vec<AnthropicStreamEvent>) {
        if self.text_block_open && !self.text_block_closed {
            events.push(AnthropicStreamEvent::ContentBlockStop { index: 0 });
            self.text_block_closed = true;
        }
    }

    fn close_message(&mut self, stop_reason: AnthropicStopReason, events: &mut Vec<AnthropicStreamEvent>) {
        self.close_text_block(events);

        let open: Vec<usize> = self.tool_blocks.keys().copied().collect();
        for index in open {
            if self.closed_tool_blocks.insert(index) {
                events.push(AnthropicStreamEvent::ContentBlockStop {
                    index: block_index(index),
                });
            }
        }

        events.push(AnthropicStreamEvent::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: Some(stop_reason),
                stop_sequence: None,
            },
            usage: self
                .usage
                .map(|usage| AnthropicUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                })
                .unwrap_or_default(),
        });
        events.push(AnthropicStreamEvent::MessageStop);

        self.finished = true;
    }
}

/// Tool blocks live above the text block: upstream index + 1.
fn block_index(upstream_index: usize) -> u32 {
    upstream_index as u32 + 1
}

fn map_stop_reason(finish_reason: Option<&FinishReason>) -> AnthropicStopReason {
    match finish_reason {
        Some(FinishReason::Length) => AnthropicStopReason::MaxTokens,
        Some(FinishReason::ToolCalls) => AnthropicStopReason::ToolUse,
        _ => AnthropicStopReason::EndTurn,
    }
}
