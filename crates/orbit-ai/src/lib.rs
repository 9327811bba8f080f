//! orbit-ai: streaming Chat Completions client
//!
//! Message and content model for multi-turn tool-calling conversations,
//! plus a streaming OpenAI-compatible Chat Completions client that emits
//! incremental [`stream::MessageEvent`]s.

pub mod error;
pub mod openai;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use openai::ChatClient;
pub use stream::{MessageBuilder, MessageEvent, MessageEventStream};
pub use types::{
    AssistantMetadata, Content, Context, Message, ModelConfig, StopReason, Tool, Usage,
};
