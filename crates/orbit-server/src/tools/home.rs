//! Home Assistant control tool

use std::sync::Arc;

use async_trait::async_trait;
use orbit_agent::{Tool, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::HomeAssistantClient;

#[derive(Deserialize)]
struct HaServiceCallArgs {
    domain: String,
    service: String,
    entity_id: Option<String>,
    data: Option<Value>,
}

pub struct HaServiceCall {
    home_assistant: Arc<HomeAssistantClient>,
}

impl HaServiceCall {
    pub fn new(home_assistant: Arc<HomeAssistantClient>) -> Self {
        Self { home_assistant }
    }
}

#[async_trait]
impl Tool for HaServiceCall {
    fn name(&self) -> &str {
        "ha_service_call"
    }

    fn description(&self) -> &str {
        "Call a Home Assistant service to control devices (e.g. domain 'light', \
         service 'turn_on', entity_id 'light.kitchen')."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "domain": {"type": "string"},
                "service": {"type": "string"},
                "entity_id": {"type": "string"},
                "data": {"type": "object"}
            },
            "required": ["domain", "service"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: HaServiceCallArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let result = self
            .home_assistant
            .call_service(
                &args.domain,
                &args.service,
                args.entity_id.as_deref(),
                args.data.as_ref(),
            )
            .await?;
        Ok(result)
    }
}
