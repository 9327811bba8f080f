//! Home Assistant REST client

use serde_json::{json, Map, Value};

use super::ServiceError;

/// Service calls against a Home Assistant instance using a long-lived
/// access token.
pub struct HomeAssistantClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HomeAssistantClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// POST `/api/services/{domain}/{service}`
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: Option<&str>,
        data: Option<&Value>,
    ) -> Result<Value, ServiceError> {
        let mut body = data
            .and_then(|d| d.as_object().cloned())
            .unwrap_or_else(Map::new);
        if let Some(entity_id) = entity_id {
            body.insert("entity_id".to_string(), Value::String(entity_id.to_string()));
        }

        let response = self
            .http
            .post(format!(
                "{}/api/services/{}/{}",
                self.base_url, domain, service
            ))
            .bearer_auth(&self.token)
            .json(&Value::Object(body))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        Ok(json!({
            "called": format!("{}.{}", domain, service),
            "entity_id": entity_id,
        }))
    }
}
