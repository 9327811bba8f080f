//! Tool-level error taxonomy

use thiserror::Error;

/// Errors a tool handler or the dispatcher can produce.
///
/// Every variant is recovered into a [`crate::tool::ToolResult`] envelope and
/// fed back to the model as a tool message; none of them abort the
/// conversation loop.
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// Requested tool is not in the registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments failed JSON parsing or schema validation
    #[error("Invalid arguments: {reason}")]
    Validation { field: String, reason: String },

    /// A required parameter is absent
    #[error("Missing required field '{0}'")]
    MissingParameter(String),

    /// The referenced entity does not exist upstream
    #[error("{0}")]
    NotFound(String),

    /// The external service itself failed
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ToolError {
    /// Create a validation error for a specific field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The stable error code serialized into result envelopes
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ToolNotFound(_) => "tool_not_found",
            Self::Validation { .. } => "validation_error",
            Self::MissingParameter(_) => "missing_parameter",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream_error",
        }
    }

    /// Structured details for the envelope, where the variant carries any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { field, reason } => Some(serde_json::json!({
                "field": field,
                "reason": reason,
            })),
            Self::MissingParameter(field) => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_codes() {
        assert_eq!(ToolError::ToolNotFound("x".into()).error_type(), "tool_not_found");
        assert_eq!(
            ToolError::validation("item", "required").error_type(),
            "validation_error"
        );
        assert_eq!(
            ToolError::MissingParameter("id".into()).error_type(),
            "missing_parameter"
        );
        assert_eq!(ToolError::NotFound("gone".into()).error_type(), "not_found");
        assert_eq!(ToolError::Upstream("500".into()).error_type(), "upstream_error");
    }

    #[test]
    fn test_validation_details() {
        let details = ToolError::validation("qty", "must be >= 1").details().unwrap();
        assert_eq!(details["field"], "qty");
        assert_eq!(details["reason"], "must be >= 1");
    }

    #[test]
    fn test_upstream_has_no_details() {
        assert!(ToolError::Upstream("boom".into()).details().is_none());
    }
}
