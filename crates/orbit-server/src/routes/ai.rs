//! AI endpoints: SSE streaming respond and the non-streaming conversation

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use orbit_agent::StreamEvent;
use orbit_ai::Message;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    prompt: Option<String>,
    /// Accepted as an alias for `prompt` on /ai/conversation
    message: Option<String>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    role: String,
    content: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn missing_prompt(field: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": format!("Missing '{}' as non-empty string", field)})),
    )
}

fn history_messages(entries: Vec<HistoryEntry>) -> Vec<Message> {
    entries
        .into_iter()
        .filter_map(|entry| match entry.role.as_str() {
            "user" => Some(Message::user(entry.content)),
            "assistant" => Some(Message::assistant(entry.content)),
            other => {
                tracing::warn!(role = other, "skipping history entry with unknown role");
                None
            }
        })
        .collect()
}

fn to_sse_frame(event: StreamEvent) -> Result<Event, Infallible> {
    Ok(Event::default().data(serde_json::to_string(&event).unwrap_or_default()))
}

/// `POST /ai/respond`: run the tool-calling loop and stream events over SSE,
/// one JSON object per frame
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let prompt = body
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| missing_prompt("prompt"))?;

    let events = state
        .responder
        .respond(prompt, history_messages(body.history));
    Ok(Sse::new(events.map(to_sse_frame)))
}

/// `POST /ai/conversation`: run the same loop, collect the text deltas, and
/// return them as one response body
pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prompt = body
        .message
        .or(body.prompt)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| missing_prompt("message' or 'prompt"))?;

    let mut events = state
        .responder
        .respond(prompt, history_messages(body.history));

    let mut response = String::new();
    while let Some(event) = events.next().await {
        if let StreamEvent::TextDelta { content } = event {
            response.push_str(&content);
        }
    }
    Ok(Json(json!({"response": response})))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use orbit_agent::{
        ChatTransport, Responder, ResponderConfig, ToolRegistry,
    };
    use orbit_ai::{Context, MessageEvent, MessageEventStream, StopReason, Usage};
    use tower::ServiceExt;

    /// Transport that always answers with a fixed text completion
    struct TextTransport(String);

    #[async_trait]
    impl ChatTransport for TextTransport {
        async fn stream(&self, _context: &Context) -> orbit_ai::Result<MessageEventStream> {
            let text = self.0.clone();
            Ok(Box::pin(async_stream::stream! {
                yield MessageEvent::TextDelta { delta: text.clone() };
                yield MessageEvent::Done {
                    message: Message::assistant(text),
                    stop_reason: StopReason::Stop,
                    usage: Usage::default(),
                };
            }))
        }
    }

    pub fn test_state(reply: &str) -> Arc<AppState> {
        let responder = Responder::new(
            Arc::new(TextTransport(reply.to_string())),
            Arc::new(ToolRegistry::builder().build()),
            ResponderConfig::new("test assistant"),
        );
        Arc::new(AppState { responder })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_respond_streams_sse_frames() {
        let app = crate::routes::router(test_state("Hello there."));
        let response = app
            .oneshot(post_json("/ai/respond", json!({"prompt": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let body = body_string(response).await;
        assert!(body.contains(r#"data: {"type":"text.delta","content":"Hello there."}"#));
        assert!(body.contains(r#"data: {"type":"done"}"#));
    }

    #[tokio::test]
    async fn test_respond_empty_prompt_is_422() {
        let app = crate::routes::router(test_state("unused"));
        let response = app
            .oneshot(post_json("/ai/respond", json!({"prompt": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_respond_missing_prompt_is_422() {
        let app = crate::routes::router(test_state("unused"));
        let response = app
            .oneshot(post_json("/ai/respond", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_conversation_collects_deltas() {
        let app = crate::routes::router(test_state("All done."));
        let response = app
            .oneshot(post_json("/ai/conversation", json!({"message": "status?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["response"], "All done.");
    }

    #[tokio::test]
    async fn test_conversation_accepts_prompt_field() {
        let app = crate::routes::router(test_state("Sure."));
        let response = app
            .oneshot(post_json("/ai/conversation", json!({"prompt": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
