//! Bounded tool-calling conversation loop

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use orbit_ai::{Context, Message, MessageEvent, StopReason};

use crate::dispatch::Dispatcher;
use crate::events::{StreamEvent, ToolState};
use crate::registry::ToolRegistry;
use crate::transport::ChatTransport;

/// Maximum chat-completion rounds per prompt.
///
/// Each tool-call round consumes one iteration, so a response that chains
/// more than this many tool turns is cut off with an error event.
pub const MAX_ITERATIONS: u32 = 5;

/// Stream of caller-facing events for one prompt
pub type StreamEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Configuration for the conversation loop
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// System prompt prepended to every conversation
    pub system_prompt: String,
    /// Iteration cap for the tool-calling loop
    pub max_iterations: u32,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl ResponderConfig {
    /// Create a config with a system prompt and the default iteration cap
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Default::default()
        }
    }
}

/// Drives streamed completions and tool execution for a single prompt.
///
/// Stateless between calls: each [`respond`](Responder::respond) builds its
/// context from the supplied history, so the same responder can serve
/// concurrent requests.
pub struct Responder {
    transport: Arc<dyn ChatTransport>,
    registry: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    config: ResponderConfig,
}

impl Responder {
    /// Create a responder over a transport and tool registry
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        registry: Arc<ToolRegistry>,
        config: ResponderConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(registry.clone());
        Self {
            transport,
            registry,
            dispatcher,
            config,
        }
    }

    /// Respond to a prompt, replaying prior turns as context.
    ///
    /// The returned stream always ends with exactly one terminal event,
    /// either `done` or `error`. Tool executions within a turn run
    /// sequentially, in the order the model requested them.
    pub fn respond(&self, prompt: impl Into<String>, history: Vec<Message>) -> StreamEventStream {
        let transport = self.transport.clone();
        let dispatcher = self.dispatcher.clone();
        let max_iterations = self.config.max_iterations;

        let mut context = Context::with_system(self.config.system_prompt.clone());
        context.tools = self.registry.definitions();
        context.messages = history;
        context.push(Message::user(prompt));

        Box::pin(stream! {
            for iteration in 1..=max_iterations {
                tracing::debug!(iteration, "starting completion round");

                let mut events = match transport.stream(&context).await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!(error = %e, "completion request failed");
                        yield StreamEvent::Error { message: e.to_string() };
                        return;
                    }
                };

                let mut final_message = None;
                let mut stop_reason = StopReason::Stop;
                let mut stream_error = None;

                while let Some(event) = events.next().await {
                    match event {
                        MessageEvent::TextDelta { delta } => {
                            yield StreamEvent::TextDelta { content: delta };
                        }
                        MessageEvent::Done { message, stop_reason: reason, .. } => {
                            final_message = Some(message);
                            stop_reason = reason;
                        }
                        MessageEvent::Error { message } => {
                            stream_error = Some(message);
                        }
                        _ => {}
                    }
                }

                if let Some(message) = stream_error {
                    tracing::error!(error = %message, "completion stream failed");
                    yield StreamEvent::Error { message };
                    return;
                }

                let Some(message) = final_message else {
                    yield StreamEvent::Error {
                        message: "model stream ended without completion".to_string(),
                    };
                    return;
                };

                if stop_reason != StopReason::ToolUse {
                    context.push(message);
                    yield StreamEvent::Done;
                    return;
                }

                // Calls missing an id or name cannot be answered with a
                // tool message, so they are dropped up front.
                let calls: Vec<(String, String, String)> = message
                    .tool_calls()
                    .into_iter()
                    .filter(|(id, name, _)| {
                        let valid = !id.is_empty() && !name.is_empty();
                        if !valid {
                            tracing::warn!(id, name, "dropping incomplete tool call");
                        }
                        valid
                    })
                    .map(|(id, name, args)| (id.to_string(), name.to_string(), args.to_string()))
                    .collect();

                if calls.is_empty() {
                    yield StreamEvent::Error {
                        message: "tool invocation failed: no valid tool calls".to_string(),
                    };
                    return;
                }

                context.push(message);

                for (id, name, args) in calls {
                    yield StreamEvent::ToolStatus {
                        name: name.clone(),
                        state: ToolState::Started,
                    };
                    let result = dispatcher.dispatch(&name, &args).await;
                    yield StreamEvent::ToolStatus {
                        name: name.clone(),
                        state: ToolState::Finished,
                    };
                    context.push(Message::tool(id, name, result.to_json()));
                }
            }

            tracing::warn!(max_iterations, "tool loop exhausted its iteration cap");
            yield StreamEvent::Error {
                message: format!("tool loop exceeded {} iterations", max_iterations),
            };
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use orbit_ai::{AssistantMetadata, Content, MessageEventStream, Usage};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Transport that replays scripted assistant messages in order,
    /// deriving stream events from each message's content.
    struct ScriptedTransport {
        turns: Mutex<Vec<Message>>,
        seen_contexts: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedTransport {
        fn new(mut turns: Vec<Message>) -> Self {
            turns.reverse();
            Self {
                turns: Mutex::new(turns),
                seen_contexts: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn stream(&self, context: &Context) -> orbit_ai::Result<MessageEventStream> {
            self.seen_contexts
                .lock()
                .unwrap()
                .push(context.messages.clone());
            let message = self
                .turns
                .lock()
                .unwrap()
                .pop()
                .expect("transport called more times than scripted");
            Ok(Box::pin(stream! {
                let mut has_tools = false;
                if let Message::Assistant { content, .. } = &message {
                    for block in content {
                        match block {
                            Content::Text { text } => {
                                yield MessageEvent::TextDelta { delta: text.clone() };
                            }
                            Content::ToolCall { .. } => has_tools = true,
                        }
                    }
                }
                let stop_reason = if has_tools {
                    StopReason::ToolUse
                } else {
                    StopReason::Stop
                };
                yield MessageEvent::Done {
                    message,
                    stop_reason,
                    usage: Usage::default(),
                };
            }))
        }
    }

    struct GroceryTool;

    #[async_trait]
    impl Tool for GroceryTool {
        fn name(&self) -> &str {
            "add_to_groceries"
        }
        fn description(&self) -> &str {
            "Add an item to the grocery list"
        }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "item": { "type": "string" } },
                "required": ["item"],
                "additionalProperties": false
            })
        }
        async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
            let item = arguments["item"].as_str().unwrap_or_default();
            if item == "unicorn" {
                return Err(ToolError::NotFound("Item not found".into()));
            }
            Ok(json!({"id": "g1", "item": item}))
        }
    }

    fn assistant_with_calls(text: Option<&str>, calls: &[(&str, &str, &str)]) -> Message {
        let mut content = vec![];
        if let Some(text) = text {
            content.push(Content::text(text));
        }
        for (id, name, args) in calls {
            content.push(Content::tool_call(*id, *name, *args));
        }
        Message::Assistant {
            content,
            metadata: AssistantMetadata::default(),
        }
    }

    fn responder(transport: Arc<dyn ChatTransport>) -> Responder {
        let registry = Arc::new(
            ToolRegistry::builder()
                .register(Arc::new(GroceryTool))
                .build(),
        );
        Responder::new(
            transport,
            registry,
            ResponderConfig::new("You are a household assistant."),
        )
    }

    async fn collect(stream: StreamEventStream) -> Vec<StreamEvent> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_tool_round_then_text_answer() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            assistant_with_calls(
                None,
                &[("call_1", "add_to_groceries", r#"{"item":"milk"}"#)],
            ),
            Message::assistant("Added milk to the list."),
        ]));
        let events = collect(responder(transport.clone()).respond("add milk", vec![])).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::ToolStatus {
                    name: "add_to_groceries".into(),
                    state: ToolState::Started,
                },
                StreamEvent::ToolStatus {
                    name: "add_to_groceries".into(),
                    state: ToolState::Finished,
                },
                StreamEvent::TextDelta {
                    content: "Added milk to the list.".into(),
                },
                StreamEvent::Done,
            ]
        );

        // Second round must carry the assistant tool-call turn plus the
        // tool result.
        let contexts = transport.seen_contexts.lock().unwrap();
        assert_eq!(contexts.len(), 2);
        let second = &contexts[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role(), "assistant");
        assert_eq!(second[2].role(), "tool");
        let result: Value = serde_json::from_str(&second[2].text()).unwrap();
        assert_eq!(result["ok"], true);
        assert_eq!(result["item"], "milk");
    }

    #[tokio::test]
    async fn test_sequential_status_pairs_for_multiple_calls() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            assistant_with_calls(
                None,
                &[
                    ("call_1", "add_to_groceries", r#"{"item":"milk"}"#),
                    ("call_2", "add_to_groceries", r#"{"item":"eggs"}"#),
                ],
            ),
            Message::assistant("Both added."),
        ]));
        let events = collect(responder(transport).respond("milk and eggs", vec![])).await;

        let statuses: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ToolStatus { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                ToolState::Started,
                ToolState::Finished,
                ToolState::Started,
                ToolState::Finished,
            ]
        );
        assert_eq!(events.last(), Some(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_iteration_cap_yields_error() {
        let turns: Vec<Message> = (0..MAX_ITERATIONS)
            .map(|i| {
                let id = format!("call_{}", i);
                assistant_with_calls(
                    None,
                    &[(id.as_str(), "add_to_groceries", r#"{"item":"milk"}"#)],
                )
            })
            .collect();
        let transport = Arc::new(ScriptedTransport::new(turns));
        let events = collect(responder(transport.clone()).respond("loop forever", vec![])).await;

        assert_eq!(
            events.last(),
            Some(&StreamEvent::Error {
                message: format!("tool loop exceeded {} iterations", MAX_ITERATIONS),
            })
        );
        // Exactly MAX_ITERATIONS completion rounds, no more.
        assert_eq!(
            transport.seen_contexts.lock().unwrap().len(),
            MAX_ITERATIONS as usize
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments_recovered_in_tool_message() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            assistant_with_calls(None, &[("call_1", "add_to_groceries", r#"{"item":"#)]),
            Message::assistant("Sorry, something went wrong adding that."),
        ]));
        let events = collect(responder(transport.clone()).respond("add milk", vec![])).await;

        // The loop continues; the failure travels back to the model.
        assert_eq!(events.last(), Some(&StreamEvent::Done));
        let contexts = transport.seen_contexts.lock().unwrap();
        let result: Value = serde_json::from_str(&contexts[1][2].text()).unwrap();
        assert_eq!(result["ok"], false);
        assert_eq!(result["error_type"], "validation_error");
    }

    #[tokio::test]
    async fn test_handler_error_recovered_in_tool_message() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            assistant_with_calls(None, &[("call_1", "add_to_groceries", r#"{"item":"unicorn"}"#)]),
            Message::assistant("I could not find that item."),
        ]));
        let events = collect(responder(transport.clone()).respond("add unicorn", vec![])).await;

        assert_eq!(events.last(), Some(&StreamEvent::Done));
        let contexts = transport.seen_contexts.lock().unwrap();
        let result: Value = serde_json::from_str(&contexts[1][2].text()).unwrap();
        assert_eq!(result["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_all_calls_invalid_yields_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![assistant_with_calls(
            None,
            &[("", "add_to_groceries", "{}"), ("call_2", "", "{}")],
        )]));
        let events = collect(responder(transport).respond("add milk", vec![])).await;

        assert_eq!(
            events,
            vec![StreamEvent::Error {
                message: "tool invocation failed: no valid tool calls".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_incomplete_call_dropped_valid_call_runs() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            assistant_with_calls(
                None,
                &[
                    ("", "add_to_groceries", "{}"),
                    ("call_2", "add_to_groceries", r#"{"item":"milk"}"#),
                ],
            ),
            Message::assistant("Added milk."),
        ]));
        let events = collect(responder(transport).respond("add milk", vec![])).await;

        let started = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::ToolStatus { state: ToolState::Started, .. }))
            .count();
        assert_eq!(started, 1);
        assert_eq!(events.last(), Some(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_text_deltas_precede_tool_status_within_round() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            assistant_with_calls(
                Some("Let me add that."),
                &[("call_1", "add_to_groceries", r#"{"item":"milk"}"#)],
            ),
            Message::assistant("Done."),
        ]));
        let events = collect(responder(transport).respond("add milk", vec![])).await;

        assert_eq!(
            events[0],
            StreamEvent::TextDelta {
                content: "Let me add that.".into()
            }
        );
        assert!(matches!(events[1], StreamEvent::ToolStatus { .. }));
    }

    #[tokio::test]
    async fn test_history_is_replayed_before_prompt() {
        let transport = Arc::new(ScriptedTransport::new(vec![Message::assistant("Hello again.")]));
        let history = vec![Message::user("hi"), Message::assistant("Hello!")];
        let _ = collect(responder(transport.clone()).respond("hi again", history)).await;

        let contexts = transport.seen_contexts.lock().unwrap();
        let roles: Vec<_> = contexts[0].iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(contexts[0][2].text(), "hi again");
    }
}
