//! Supabase PostgREST client for the groceries and tasks tables

use serde_json::Value;

use super::ServiceError;

/// Minimal PostgREST wrapper.
///
/// Inserts and updates send `Prefer: return=representation` so every write
/// comes back with the stored row; an update that matches no rows returns an
/// empty array, which callers treat as not-found.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Create a client for a project URL and service-role key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Insert a row, returning the stored representation
    pub async fn insert(&self, table: &str, row: &Value) -> Result<Value, ServiceError> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(ServiceError::Upstream {
                status: 200,
                body: "insert returned no rows".to_string(),
            });
        }
        Ok(rows.remove(0))
    }

    /// Select rows with PostgREST filter pairs (e.g. `("purchased", "eq.false")`)
    pub async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
        order: &str,
        limit: u32,
    ) -> Result<Vec<Value>, ServiceError> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", order.to_string()),
            ("limit", limit.to_string()),
        ];
        query.extend(filters.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .request(reqwest::Method::GET, table)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }
        Ok(response.json().await?)
    }

    /// Update the row with the given id; `Ok(None)` when no row matched
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        patch: &Value,
    ) -> Result<Option<Value>, ServiceError> {
        let response = self
            .request(reqwest::Method::PATCH, table)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }
}
