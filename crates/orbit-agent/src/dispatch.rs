//! Tool dispatcher: lookup, validate, invoke, normalize

use std::sync::Arc;

use crate::error::ToolError;
use crate::registry::ToolRegistry;
use crate::tool::ToolResult;

/// Validates tool-call arguments against the registry and invokes handlers.
///
/// Every outcome, including unknown tools and handler failures, is returned
/// as a [`ToolResult`] envelope; `dispatch` never fails.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Run a tool by name with raw (unparsed) JSON arguments
    pub async fn dispatch(&self, name: &str, raw_args: &str) -> ToolResult {
        let Some(tool) = self.registry.get(name) else {
            tracing::warn!(tool = name, "tool not in registry");
            return ToolResult::from_error(&ToolError::ToolNotFound(name.to_string()));
        };

        // An empty argument blob means "no arguments".
        let args: serde_json::Value = if raw_args.trim().is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(raw_args) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(tool = name, error = %e, "malformed tool arguments");
                    return ToolResult::from_error(&ToolError::validation(
                        "arguments",
                        format!("invalid JSON: {}", e),
                    ));
                }
            }
        };

        if let Some((field, reason)) = self.registry.validate(name, &args) {
            tracing::warn!(tool = name, field = %field, "tool argument validation failed");
            return ToolResult::from_error(&ToolError::validation(field, reason));
        }

        tracing::info!(tool = name, "tool start");
        match tool.call(args).await {
            Ok(data) => {
                tracing::info!(tool = name, "tool finished");
                ToolResult::ok(data)
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, error_type = e.error_type(), "tool failed");
                ToolResult::from_error(&e)
            }
        }
    }
}
