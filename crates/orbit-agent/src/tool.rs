//! Tool trait and result envelope

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::ToolError;

/// Trait for executable tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in API calls)
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with schema-validated arguments.
    ///
    /// Returns the success payload as a JSON object; errors are normalized
    /// by the dispatcher, never propagated further.
    async fn call(&self, arguments: Value) -> Result<Value, ToolError>;
}

/// Type alias for a shared tool
pub type BoxedTool = Arc<dyn Tool>;

/// Convert a Tool to an API tool definition
pub fn to_api_tool(tool: &dyn Tool) -> orbit_ai::Tool {
    orbit_ai::Tool {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
    }
}

/// Result of a tool execution, in the wire envelope fed back to the model.
///
/// Serializes as `{"ok":true, ...data}` on success and
/// `{"ok":false,"error":...,"error_type":...,"details":...}` on failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Ok(Value),
    Err {
        error: String,
        error_type: String,
        details: Option<Value>,
    },
}

impl ToolResult {
    /// Create a successful result from a data payload
    pub fn ok(data: Value) -> Self {
        Self::Ok(data)
    }

    /// Create an error envelope from a tool error
    pub fn from_error(e: &ToolError) -> Self {
        Self::Err {
            error: e.to_string(),
            error_type: e.error_type().to_string(),
            details: e.details(),
        }
    }

    /// Whether the execution succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The error code, if this is an error envelope
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Err { error_type, .. } => Some(error_type),
        }
    }

    /// Render the envelope as a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            Self::Ok(data) => {
                let mut obj = Map::new();
                obj.insert("ok".to_string(), Value::Bool(true));
                match data {
                    Value::Object(fields) => {
                        for (k, v) in fields {
                            obj.insert(k.clone(), v.clone());
                        }
                    }
                    Value::Null => {}
                    other => {
                        obj.insert("data".to_string(), other.clone());
                    }
                }
                Value::Object(obj)
            }
            Self::Err {
                error,
                error_type,
                details,
            } => {
                let mut obj = Map::new();
                obj.insert("ok".to_string(), Value::Bool(false));
                obj.insert("error".to_string(), Value::String(error.clone()));
                obj.insert("error_type".to_string(), Value::String(error_type.clone()));
                if let Some(details) = details {
                    obj.insert("details".to_string(), details.clone());
                }
                Value::Object(obj)
            }
        }
    }

    /// Serialize the envelope for a tool-role message
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Re-parse an envelope from its tool-message serialization
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        match obj.get("ok")?.as_bool()? {
            true => {
                let mut data = obj.clone();
                data.remove("ok");
                Some(Self::Ok(Value::Object(data)))
            }
            false => Some(Self::Err {
                error: obj.get("error")?.as_str()?.to_string(),
                error_type: obj.get("error_type")?.as_str()?.to_string(),
                details: obj.get("details").cloned(),
            }),
        }
    }
}
