//! Chat transport abstraction

use async_trait::async_trait;
use orbit_ai::{ChatClient, Context, MessageEventStream, ModelConfig, Result};

/// Seam between the conversation loop and the chat-completion endpoint.
///
/// The loop only needs "stream a completion for this context"; tests plug in
/// a scripted implementation here.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streaming completion for the given context
    async fn stream(&self, context: &Context) -> Result<MessageEventStream>;
}

/// Transport backed by the OpenAI Chat Completions client.
///
/// No retry, backoff, or per-request timeout is applied here beyond the HTTP
/// client's defaults; a failed call surfaces as a single terminal error.
pub struct OpenAiTransport {
    client: ChatClient,
    model: ModelConfig,
}

impl OpenAiTransport {
    /// Create a transport for a configured model
    pub fn new(client: ChatClient, model: ModelConfig) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn stream(&self, context: &Context) -> Result<MessageEventStream> {
        self.client.stream(&self.model, context).await
    }
}
