//! Task tools backed by the Supabase `tasks` table

use std::sync::Arc;

use async_trait::async_trait;
use orbit_agent::{Tool, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::SupabaseClient;

fn default_priority() -> String {
    "Med".to_string()
}

#[derive(Deserialize)]
struct CreateTaskArgs {
    title: String,
    due: String,
    context: Option<String>,
    #[serde(default = "default_priority")]
    priority: String,
}

pub struct CreateTask {
    supabase: Arc<SupabaseClient>,
}

impl CreateTask {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Tool for CreateTask {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a task in the tasks list."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "due": {"type": "string", "description": "ISO8601 date-time"},
                "context": {"type": "string"},
                "priority": {"type": "string", "enum": ["Low", "Med", "High"], "default": "Med"}
            },
            "required": ["title", "due"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CreateTaskArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let priority = match args.priority.as_str() {
            "Low" => "low",
            "High" => "high",
            _ => "medium",
        };

        let row = self
            .supabase
            .insert(
                "tasks",
                &json!({
                    "title": args.title,
                    "description": args.context.as_deref().unwrap_or(""),
                    "status": "todo",
                    "priority": priority,
                    "due_date": args.due,
                }),
            )
            .await?;

        Ok(json!({"task_id": row["id"], "title": row["title"]}))
    }
}

#[derive(Deserialize)]
struct UpdateTaskStatusArgs {
    id: String,
    status: String,
}

pub struct UpdateTaskStatus {
    supabase: Arc<SupabaseClient>,
}

impl UpdateTaskStatus {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Tool for UpdateTaskStatus {
    fn name(&self) -> &str {
        "update_task_status"
    }

    fn description(&self) -> &str {
        "Update a task status using the UUID from list results."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "UUID of the task from list results"
                },
                "status": {"type": "string", "enum": ["Not Started", "In Progress", "Done"]}
            },
            "required": ["id", "status"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: UpdateTaskStatusArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        // The table stores lowercase status codes.
        let status = match args.status.as_str() {
            "In Progress" => "in_progress",
            "Done" => "done",
            _ => "todo",
        };

        let updated = self
            .supabase
            .update(
                "tasks",
                &args.id,
                &json!({
                    "status": status,
                    "updated_at": chrono::Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        if updated.is_none() {
            return Err(ToolError::NotFound("Task not found".to_string()));
        }
        Ok(json!({"id": args.id, "status": status}))
    }
}

fn default_list_limit() -> u32 {
    50
}

#[derive(Deserialize)]
struct ListTasksArgs {
    status: Option<String>,
    #[serde(default = "default_list_limit")]
    limit: u32,
}

pub struct ListTasks {
    supabase: Arc<SupabaseClient>,
}

impl ListTasks {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Tool for ListTasks {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "List tasks with optional status filter. Returns tasks with both idx (1-based \
         index for easy reference like 'task 1') and id (UUID for updates). Use the id \
         field when calling update_task_status."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["todo", "in_progress", "done", "archived"],
                    "description": "Filter by task status (optional)"
                },
                "limit": {"type": "integer", "minimum": 1, "maximum": 250, "default": 50}
            },
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ListTasksArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let mut filters: Vec<(&str, String)> = vec![];
        if let Some(status) = &args.status {
            filters.push(("status", format!("eq.{}", status)));
        }

        let rows = self
            .supabase
            .select("tasks", &filters, "created_at.asc", args.limit)
            .await?;

        let tasks: Vec<Value> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                json!({
                    "idx": i + 1,
                    "id": row["id"],
                    "title": row["title"],
                    "status": row["status"],
                    "created_at": row["created_at"],
                })
            })
            .collect();

        Ok(json!({"count": tasks.len(), "tasks": tasks}))
    }
}
