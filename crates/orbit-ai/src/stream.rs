//! Streaming event types and accumulation

use crate::types::{AssistantMetadata, Content, Message, StopReason, Usage};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while streaming an assistant message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    /// Text content delta
    TextDelta { delta: String },
    /// A tool call appeared in the stream, keyed by its index
    ToolCallStart {
        index: usize,
        id: String,
        name: String,
    },
    /// Tool call argument fragment (partial JSON, arrival order significant)
    ToolCallDelta { index: usize, delta: String },
    /// Message completed
    Done {
        message: Message,
        stop_reason: StopReason,
        usage: Usage,
    },
    /// Error occurred
    Error { message: String },
}

impl MessageEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageEvent::Done { .. } | MessageEvent::Error { .. })
    }
}

/// A stream of message events
pub type MessageEventStream = Pin<Box<dyn Stream<Item = MessageEvent> + Send>>;

/// Builds an assistant message by accumulating streamed deltas.
///
/// Text deltas concatenate into one text block; tool-call argument fragments
/// concatenate per index in arrival order. The raw argument strings are kept
/// as-is; nothing here attempts to parse them as JSON.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    text: String,
    tool_calls: Vec<PartialToolCall>,
    usage: Usage,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a streaming event and update the accumulated state
    pub fn process_event(&mut self, event: &MessageEvent) {
        match event {
            MessageEvent::TextDelta { delta } => {
                self.text.push_str(delta);
            }
            MessageEvent::ToolCallStart { index, id, name } => {
                self.ensure_slot(*index);
                let slot = &mut self.tool_calls[*index];
                if !id.is_empty() {
                    slot.id = id.clone();
                }
                if !name.is_empty() {
                    slot.name = name.clone();
                }
            }
            MessageEvent::ToolCallDelta { index, delta } => {
                self.ensure_slot(*index);
                self.tool_calls[*index].arguments.push_str(delta);
            }
            _ => {}
        }
    }

    /// Record token usage for the final message's metadata
    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    /// Build the final assistant message
    pub fn build(self, model: Option<String>, stop_reason: Option<StopReason>) -> Message {
        let mut content = Vec::new();
        if !self.text.is_empty() {
            content.push(Content::Text { text: self.text });
        }
        for call in self.tool_calls {
            content.push(Content::ToolCall {
                id: call.id,
                name: call.name,
                arguments: call.arguments,
            });
        }

        Message::Assistant {
            content,
            metadata: AssistantMetadata {
                model,
                usage: self.usage,
                stop_reason,
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        }
    }

    fn ensure_slot(&mut self, index: usize) {
        while self.tool_calls.len() <= index {
            self.tool_calls.push(PartialToolCall::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_deltas_concatenate() {
        let mut builder = MessageBuilder::new();
        builder.process_event(&MessageEvent::TextDelta { delta: "Hel".into() });
        builder.process_event(&MessageEvent::TextDelta { delta: "lo".into() });
        let msg = builder.build(None, Some(StopReason::Stop));
        assert_eq!(msg.text(), "Hello");
    }

    #[test]
    fn test_tool_call_fragments_concatenate_in_order() {
        let mut builder = MessageBuilder::new();
        builder.process_event(&MessageEvent::ToolCallStart {
            index: 0,
            id: "call_1".into(),
            name: "add_to_groceries".into(),
        });
        builder.process_event(&MessageEvent::ToolCallDelta {
            index: 0,
            delta: r#"{"item":"#.into(),
        });
        builder.process_event(&MessageEvent::ToolCallDelta {
            index: 0,
            delta: r#""milk"}"#.into(),
        });
        let msg = builder.build(None, Some(StopReason::ToolUse));
        let calls = msg.tool_calls();
        assert_eq!(calls, vec![("call_1", "add_to_groceries", r#"{"item":"milk"}"#)]);
    }

    #[test]
    fn test_interleaved_tool_calls_keyed_by_index() {
        let mut builder = MessageBuilder::new();
        builder.process_event(&MessageEvent::ToolCallStart {
            index: 0,
            id: "a".into(),
            name: "first".into(),
        });
        builder.process_event(&MessageEvent::ToolCallStart {
            index: 1,
            id: "b".into(),
            name: "second".into(),
        });
        builder.process_event(&MessageEvent::ToolCallDelta { index: 1, delta: "{}".into() });
        builder.process_event(&MessageEvent::ToolCallDelta { index: 0, delta: "{".into() });
        builder.process_event(&MessageEvent::ToolCallDelta { index: 0, delta: "}".into() });
        let msg = builder.build(None, Some(StopReason::ToolUse));
        let calls = msg.tool_calls();
        assert_eq!(calls[0], ("a", "first", "{}"));
        assert_eq!(calls[1], ("b", "second", "{}"));
    }

    #[test]
    fn test_text_and_tool_call_both_kept() {
        let mut builder = MessageBuilder::new();
        builder.process_event(&MessageEvent::TextDelta { delta: "sure".into() });
        builder.process_event(&MessageEvent::ToolCallStart {
            index: 0,
            id: "c".into(),
            name: "create_event".into(),
        });
        let msg = builder.build(Some("gpt-4o-mini".into()), Some(StopReason::ToolUse));
        assert_eq!(msg.text(), "sure");
        assert_eq!(msg.tool_calls().len(), 1);
    }
}
