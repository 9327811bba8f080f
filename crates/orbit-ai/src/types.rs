//! Core types for chat-completion interactions

use serde::{Deserialize, Serialize};

/// Configuration for the model behind the chat-completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "gpt-4o-mini")
    pub id: String,
    /// Base URL for API calls
    pub base_url: String,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Maximum output tokens
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ModelConfig {
    /// Create a config for a model on the default OpenAI endpoint
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input: u32,
    pub output: u32,
}

/// Reason why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    Stop,
    /// Maximum tokens reached
    Length,
    /// Tool use requested
    ToolUse,
    /// Error occurred
    Error,
}

/// Content types in messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Text content
    Text { text: String },
    /// Tool call request. Arguments are the raw JSON string as streamed by
    /// the model; parsing is deferred to the dispatcher.
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },
}

impl Content {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool call
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Get text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Check if this is a tool call
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. })
    }
}

/// Message roles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// User message
    User {
        content: Vec<Content>,
        #[serde(default)]
        timestamp: i64,
    },
    /// Assistant response
    Assistant {
        content: Vec<Content>,
        #[serde(flatten)]
        metadata: AssistantMetadata,
    },
    /// Tool result, referencing the originating tool call
    Tool {
        tool_call_id: String,
        tool_name: String,
        content: String,
        #[serde(default)]
        timestamp: i64,
    },
}

/// Metadata for assistant messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantMetadata {
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Usage,
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: vec![Content::text(text)],
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create an assistant message with text content (used for replayed history)
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: vec![Content::text(text)],
            metadata: AssistantMetadata {
                timestamp: chrono::Utc::now().timestamp_millis(),
                ..Default::default()
            },
        }
    }

    /// Create a tool result message
    pub fn tool(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Get the role as a string
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    /// Extract all tool calls from an assistant message
    pub fn tool_calls(&self) -> Vec<(&str, &str, &str)> {
        match self {
            Self::Assistant { content, .. } => content
                .iter()
                .filter_map(|c| match c {
                    Content::ToolCall {
                        id,
                        name,
                        arguments,
                    } => Some((id.as_str(), name.as_str(), arguments.as_str())),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Get combined text content
    pub fn text(&self) -> String {
        match self {
            Self::User { content, .. } | Self::Assistant { content, .. } => content
                .iter()
                .filter_map(|c| c.as_text())
                .collect::<Vec<_>>()
                .join(""),
            Self::Tool { content, .. } => content.clone(),
        }
    }
}

/// Tool definition for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (used in API calls)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Context for a chat-completion request
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// System prompt
    pub system_prompt: Option<String>,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Available tools
    pub tools: Vec<Tool>,
}

impl Context {
    /// Create a new context with a system prompt
    pub fn with_system(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(system_prompt.into()),
            messages: vec![],
            tools: vec![],
        }
    }

    /// Add a message to the context
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_calls_accessor() {
        let msg = Message::Assistant {
            content: vec![
                Content::text("on it"),
                Content::tool_call("call_1", "create_task", r#"{"title":"x"}"#),
            ],
            metadata: AssistantMetadata::default(),
        };
        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("call_1", "create_task", r#"{"title":"x"}"#));
    }

    #[test]
    fn test_tool_calls_empty_for_other_roles() {
        assert!(Message::user("hi").tool_calls().is_empty());
        assert!(Message::tool("c1", "t", "{}").tool_calls().is_empty());
    }

    #[test]
    fn test_text_joins_blocks() {
        let msg = Message::Assistant {
            content: vec![Content::text("a"), Content::text("b")],
            metadata: AssistantMetadata::default(),
        };
        assert_eq!(msg.text(), "ab");
    }

    #[test]
    fn test_message_roles() {
        assert_eq!(Message::user("x").role(), "user");
        assert_eq!(Message::assistant("x").role(), "assistant");
        assert_eq!(Message::tool("id", "name", "{}").role(), "tool");
    }
}
