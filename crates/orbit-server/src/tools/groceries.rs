//! Grocery-list tools backed by the Supabase `groceries` table

use std::sync::Arc;

use async_trait::async_trait;
use orbit_agent::{Tool, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::SupabaseClient;

fn default_qty() -> u32 {
    1
}

#[derive(Deserialize)]
struct AddToGroceriesArgs {
    item: String,
    #[serde(default = "default_qty")]
    qty: u32,
    notes: Option<String>,
}

pub struct AddToGroceries {
    supabase: Arc<SupabaseClient>,
}

impl AddToGroceries {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Tool for AddToGroceries {
    fn name(&self) -> &str {
        "add_to_groceries"
    }

    fn description(&self) -> &str {
        "Add an item to the groceries list."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item": {"type": "string"},
                "qty": {"type": "integer", "minimum": 1, "default": 1},
                "notes": {"type": "string"}
            },
            "required": ["item"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: AddToGroceriesArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let row = self
            .supabase
            .insert(
                "groceries",
                &json!({
                    "item": args.item,
                    "quantity": args.qty,
                    "category": args.notes.as_deref().unwrap_or("General"),
                    "purchased": false,
                }),
            )
            .await?;

        Ok(json!({
            "id": row["id"],
            "item": {
                "id": row["id"],
                "name": row["item"],
                "qty": row["quantity"],
                "category": row["category"],
                "purchased": row["purchased"],
                "added_at": row["created_at"],
            }
        }))
    }
}

#[derive(Deserialize)]
struct UpdateGroceryStatusArgs {
    id: String,
    status: String,
}

pub struct UpdateGroceryStatus {
    supabase: Arc<SupabaseClient>,
}

impl UpdateGroceryStatus {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Tool for UpdateGroceryStatus {
    fn name(&self) -> &str {
        "update_grocery_status"
    }

    fn description(&self) -> &str {
        "Update a grocery item status using the UUID from list results."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "UUID of the grocery item from list results"
                },
                "status": {"type": "string", "enum": ["Needed", "Added", "Ordered"]}
            },
            "required": ["id", "status"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: UpdateGroceryStatusArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        // The table tracks a purchased flag; "Needed" is the only
        // un-purchased status.
        let purchased = args.status != "Needed";
        let updated = self
            .supabase
            .update("groceries", &args.id, &json!({"purchased": purchased}))
            .await?;

        if updated.is_none() {
            return Err(ToolError::NotFound("Grocery item not found".to_string()));
        }
        Ok(json!({"id": args.id, "status": args.status}))
    }
}

fn default_list_limit() -> u32 {
    100
}

#[derive(Deserialize)]
struct ListGroceriesArgs {
    status: Option<String>,
    #[serde(default = "default_list_limit")]
    limit: u32,
}

pub struct ListGroceries {
    supabase: Arc<SupabaseClient>,
}

impl ListGroceries {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Tool for ListGroceries {
    fn name(&self) -> &str {
        "list_groceries"
    }

    fn description(&self) -> &str {
        "List grocery items with optional status filter. Returns items with both idx \
         (1-based index for easy reference like 'item 1') and id (UUID for updates). \
         Use the id field when calling update_grocery_status."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["needed", "in_cart", "purchased"],
                    "description": "Filter by grocery status (optional)"
                },
                "limit": {"type": "integer", "minimum": 1, "maximum": 500, "default": 100}
            },
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ListGroceriesArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let mut filters: Vec<(&str, String)> = vec![];
        match args.status.as_deref() {
            Some("purchased") => filters.push(("purchased", "eq.true".to_string())),
            Some(_) => filters.push(("purchased", "eq.false".to_string())),
            None => {}
        }

        let rows = self
            .supabase
            .select("groceries", &filters, "created_at.asc", args.limit)
            .await?;

        let items: Vec<Value> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let status = if row["purchased"].as_bool().unwrap_or(false) {
                    "purchased"
                } else {
                    "needed"
                };
                json!({
                    "idx": i + 1,
                    "id": row["id"],
                    "name": row["item"],
                    "status": status,
                    "created_at": row["created_at"],
                })
            })
            .collect();

        Ok(json!({"count": items.len(), "items": items}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn test_add_inserts_defaults() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/rest/v1/groceries"),
                request::body(json_decoded(eq(json!({
                    "item": "milk",
                    "quantity": 1,
                    "category": "General",
                    "purchased": false
                })))),
            ])
            .respond_with(json_encoded(json!([{
                "id": "g1", "item": "milk", "quantity": 1,
                "category": "General", "purchased": false,
                "created_at": "2026-08-30T10:00:00Z"
            }]))),
        );

        let tool = AddToGroceries::new(Arc::new(SupabaseClient::new(server.url_str(""), "key")));
        let result = tool.call(json!({"item": "milk"})).await.unwrap();
        assert_eq!(result["id"], "g1");
        assert_eq!(result["item"]["name"], "milk");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PATCH", "/rest/v1/groceries"))
                .respond_with(json_encoded(json!([]))),
        );

        let tool =
            UpdateGroceryStatus::new(Arc::new(SupabaseClient::new(server.url_str(""), "key")));
        let err = tool
            .call(json!({"id": "nope", "status": "Ordered"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_maps_idx_and_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/rest/v1/groceries"),
                request::query(url_decoded(contains(("purchased", "eq.false")))),
            ])
            .respond_with(json_encoded(json!([
                {"id": "g1", "item": "milk", "purchased": false, "created_at": "t1"},
                {"id": "g2", "item": "eggs", "purchased": false, "created_at": "t2"}
            ]))),
        );

        let tool = ListGroceries::new(Arc::new(SupabaseClient::new(server.url_str(""), "key")));
        let result = tool.call(json!({"status": "needed"})).await.unwrap();
        assert_eq!(result["count"], 2);
        assert_eq!(result["items"][0]["idx"], 1);
        assert_eq!(result["items"][1]["id"], "g2");
        assert_eq!(result["items"][1]["status"], "needed");
    }
}
