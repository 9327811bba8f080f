//! Immutable tool registry with pre-compiled schema validators

use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::{to_api_tool, BoxedTool};

struct RegisteredTool {
    tool: BoxedTool,
    /// Compiled parameter-schema validator; `None` if the schema failed to
    /// compile, in which case validation is skipped for this tool.
    validator: Option<Arc<jsonschema::Validator>>,
}

/// Static mapping from tool name to schema + handler.
///
/// Built once at startup and passed by reference into the conversation loop;
/// there is no dynamic registration. Registration order is preserved so the
/// model sees a stable tool list.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder { tools: Vec::new() }
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.by_name.get(name).map(|&i| &self.tools[i].tool)
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.tool.name()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// API tool definitions advertised to the model, in registration order
    pub fn definitions(&self) -> Vec<orbit_ai::Tool> {
        self.tools
            .iter()
            .map(|t| to_api_tool(t.tool.as_ref()))
            .collect()
    }

    /// Validate arguments against the tool's compiled schema.
    ///
    /// Returns `Some((field, reason))` for the first failing field, `None`
    /// when valid, when the tool is unknown, or when its schema did not
    /// compile.
    pub fn validate(&self, name: &str, args: &serde_json::Value) -> Option<(String, String)> {
        let registered = self.by_name.get(name).map(|&i| &self.tools[i])?;
        let validator = registered.validator.as_ref()?;
        validator
            .iter_errors(args)
            .next()
            .map(|e| (e.instance_path.to_string(), e.to_string()))
    }
}

/// Builder for [`ToolRegistry`]
pub struct ToolRegistryBuilder {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistryBuilder {
    /// Register a tool, compiling its parameter schema
    pub fn register(mut self, tool: BoxedTool) -> Self {
        let schema = tool.parameters_schema();
        let validator = match jsonschema::validator_for(&schema) {
            Ok(v) => Some(Arc::new(v)),
            Err(e) => {
                tracing::warn!(
                    "Invalid tool parameter schema for '{}', skipping validation: {}",
                    tool.name(),
                    e
                );
                None
            }
        };
        self.tools.push(RegisteredTool { tool, validator });
        self
    }

    /// Finalize the registry
    pub fn build(self) -> ToolRegistry {
        let by_name = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.tool.name().to_string(), i))
            .collect();
        ToolRegistry {
            tools: self.tools,
            by_name,
        }
    }
}
