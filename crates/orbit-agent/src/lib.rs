//! orbit-agent: tool-calling conversation runtime
//!
//! The conversation loop drives a bounded number of streamed
//! chat-completion rounds, intercepting tool-call requests and feeding
//! dispatcher results back into the conversation.

pub mod dispatch;
pub mod error;
pub mod events;
pub mod registry;
pub mod respond;
pub mod tool;
pub mod transport;

pub use dispatch::Dispatcher;
pub use error::ToolError;
pub use events::{StreamEvent, ToolState};
pub use registry::ToolRegistry;
pub use respond::{Responder, ResponderConfig, StreamEventStream, MAX_ITERATIONS};
pub use tool::{BoxedTool, Tool, ToolResult};
pub use transport::{ChatTransport, OpenAiTransport};
