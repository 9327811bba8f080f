//! Caller-facing stream events

use serde::{Deserialize, Serialize};

/// Execution state reported in `tool.status` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolState {
    Started,
    Finished,
}

/// Events emitted to the caller while responding to a prompt.
///
/// One-way and not persisted; the HTTP layer maps each event onto exactly
/// one SSE frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Incremental assistant text
    #[serde(rename = "text.delta")]
    TextDelta { content: String },

    /// A tool execution started or finished
    #[serde(rename = "tool.status")]
    ToolStatus { name: String, state: ToolState },

    /// The response completed successfully
    #[serde(rename = "done")]
    Done,

    /// The request failed terminally
    #[serde(rename = "error")]
    Error { message: String },
}

impl StreamEvent {
    /// Check if this event terminates the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        let delta = serde_json::to_value(StreamEvent::TextDelta {
            content: "hi".into(),
        })
        .unwrap();
        assert_eq!(delta, serde_json::json!({"type": "text.delta", "content": "hi"}));

        let status = serde_json::to_value(StreamEvent::ToolStatus {
            name: "create_event".into(),
            state: ToolState::Started,
        })
        .unwrap();
        assert_eq!(
            status,
            serde_json::json!({"type": "tool.status", "name": "create_event", "state": "started"})
        );

        assert_eq!(
            serde_json::to_value(StreamEvent::Done).unwrap(),
            serde_json::json!({"type": "done"})
        );
    }

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::Error { message: "x".into() }.is_terminal());
        assert!(!StreamEvent::TextDelta { content: "x".into() }.is_terminal());
    }
}
