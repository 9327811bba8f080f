//! OpenAI Chat Completions API client

use async_stream::stream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    stream::{MessageBuilder, MessageEvent, MessageEventStream},
    types::{Content, Context, Message, ModelConfig, StopReason, Usage},
};

/// Streaming client for an OpenAI-compatible Chat Completions endpoint
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
}

impl ChatClient {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create from the OPENAI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Stream a chat completion for the given context
    pub async fn stream(&self, model: &ModelConfig, context: &Context) -> Result<MessageEventStream> {
        let request = build_request(model, context);
        let url = format!("{}/chat/completions", model.base_url);

        let request_builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request);

        let event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(Box::pin(create_stream(event_source, model.clone())))
    }
}

fn build_request(model: &ModelConfig, context: &Context) -> ChatRequest {
    let mut messages = Vec::new();

    if let Some(ref system_prompt) = context.system_prompt {
        messages.push(WireMessage {
            role: "system".to_string(),
            content: Some(system_prompt.clone()),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for msg in &context.messages {
        messages.push(convert_message(msg));
    }

    let tools: Vec<WireTool> = context
        .tools
        .iter()
        .map(|t| WireTool {
            tool_type: "function".to_string(),
            function: WireFunction {
                name: t.name.clone(),
                description: Some(t.description.clone()),
                parameters: Some(t.parameters.clone()),
            },
        })
        .collect();

    ChatRequest {
        model: model.id.clone(),
        messages,
        stream: true,
        max_tokens: model.max_tokens,
        temperature: model.temperature,
        tools: if tools.is_empty() { None } else { Some(tools) },
    }
}

fn convert_message(msg: &Message) -> WireMessage {
    match msg {
        Message::User { content, .. } => WireMessage {
            role: "user".to_string(),
            content: Some(
                content
                    .iter()
                    .filter_map(|c| c.as_text())
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant { content, .. } => {
            let mut text_parts = Vec::new();
            let mut tool_calls = Vec::new();

            for c in content {
                match c {
                    Content::Text { text } => text_parts.push(text.as_str()),
                    Content::ToolCall {
                        id,
                        name,
                        arguments,
                    } => tool_calls.push(WireToolCall {
                        id: id.clone(),
                        call_type: "function".to_string(),
                        function: WireFunctionCall {
                            name: name.clone(),
                            arguments: arguments.clone(),
                        },
                    }),
                }
            }

            WireMessage {
                role: "assistant".to_string(),
                content: if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join(""))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            }
        }
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => WireMessage {
            role: "tool".to_string(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

fn create_stream(
    mut event_source: EventSource,
    model: ModelConfig,
) -> impl futures::Stream<Item = MessageEvent> {
    stream! {
        let mut builder = MessageBuilder::new();
        // Last seen tool-call id per stream index; ids can arrive in a chunk
        // before the name does.
        let mut ids: Vec<String> = Vec::new();
        let mut finish_reason: Option<String> = None;
        let mut usage = Usage::default();

        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    if msg.data == "[DONE]" {
                        break;
                    }

                    let chunk: std::result::Result<StreamChunk, _> = serde_json::from_str(&msg.data);
                    match chunk {
                        Ok(chunk) => {
                            for choice in &chunk.choices {
                                if let Some(ref content) = choice.delta.content {
                                    let event = MessageEvent::TextDelta {
                                        delta: content.clone(),
                                    };
                                    builder.process_event(&event);
                                    yield event;
                                }

                                if let Some(ref tcs) = choice.delta.tool_calls {
                                    for tc in tcs {
                                        let idx = tc.index as usize;
                                        while ids.len() <= idx {
                                            ids.push(String::new());
                                        }
                                        if let Some(ref id) = tc.id {
                                            ids[idx] = id.clone();
                                        }

                                        let Some(ref function) = tc.function else {
                                            continue;
                                        };
                                        if let Some(ref name) = function.name {
                                            let event = MessageEvent::ToolCallStart {
                                                index: idx,
                                                id: ids[idx].clone(),
                                                name: name.clone(),
                                            };
                                            builder.process_event(&event);
                                            yield event;
                                        }
                                        if let Some(ref args) = function.arguments {
                                            let event = MessageEvent::ToolCallDelta {
                                                index: idx,
                                                delta: args.clone(),
                                            };
                                            builder.process_event(&event);
                                            yield event;
                                        }
                                    }
                                }

                                if let Some(ref reason) = choice.finish_reason {
                                    finish_reason = Some(reason.clone());
                                }
                            }

                            if let Some(ref stream_usage) = chunk.usage {
                                usage.input = stream_usage.prompt_tokens;
                                usage.output = stream_usage.completion_tokens;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "unparseable stream chunk");
                            yield MessageEvent::Error {
                                message: format!("Failed to parse chunk: {}", e),
                            };
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "completion stream failed");
                    yield MessageEvent::Error {
                        message: format!("SSE error: {}", e),
                    };
                    return;
                }
            }
        }

        let stop_reason = match finish_reason.as_deref() {
            Some("stop") => StopReason::Stop,
            Some("length") => StopReason::Length,
            Some("tool_calls") => StopReason::ToolUse,
            _ => StopReason::Stop,
        };

        builder.set_usage(usage.clone());
        let final_message = builder.build(Some(model.id.clone()), Some(stop_reason));

        yield MessageEvent::Done {
            message: final_message,
            stop_reason,
            usage,
        };
    }
}

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<StreamUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    index: i32,
    id: Option<String>,
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
