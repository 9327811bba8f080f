//! Calendar tools backed by Google Calendar

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use orbit_agent::{Tool, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::CalendarClient;

#[derive(Deserialize)]
struct CreateEventArgs {
    title: String,
    start: String,
    end: String,
    description: Option<String>,
}

pub struct CreateEvent {
    calendar: Arc<CalendarClient>,
}

impl CreateEvent {
    pub fn new(calendar: Arc<CalendarClient>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for CreateEvent {
    fn name(&self) -> &str {
        "create_event"
    }

    fn description(&self) -> &str {
        "Create a calendar event."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "start": {"type": "string", "description": "ISO8601 date-time"},
                "end": {"type": "string", "description": "ISO8601 date-time"},
                "description": {"type": "string"}
            },
            "required": ["title", "start", "end"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CreateEventArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let created = self
            .calendar
            .create_event(&args.title, &args.start, &args.end, args.description.as_deref())
            .await?;
        Ok(created)
    }
}

fn default_max_results() -> u32 {
    50
}

#[derive(Deserialize)]
struct ListCalendarEventsArgs {
    from_dt: Option<String>,
    to_dt: Option<String>,
    #[serde(default = "default_max_results")]
    max_results: u32,
}

pub struct ListCalendarEvents {
    calendar: Arc<CalendarClient>,
}

impl ListCalendarEvents {
    pub fn new(calendar: Arc<CalendarClient>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for ListCalendarEvents {
    fn name(&self) -> &str {
        "list_calendar_events"
    }

    fn description(&self) -> &str {
        "Read upcoming calendar events within a date window. Returns events with id, \
         title, start/end times, and location. Defaults to showing the next 7 days if \
         no dates specified."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from_dt": {
                    "type": "string",
                    "description": "ISO8601 datetime (optional, defaults to now)"
                },
                "to_dt": {
                    "type": "string",
                    "description": "ISO8601 datetime (optional, defaults to now + 7 days)"
                },
                "max_results": {"type": "integer", "minimum": 1, "maximum": 250, "default": 50}
            },
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ListCalendarEventsArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let now = Utc::now();
        let from = args
            .from_dt
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));
        let to = args
            .to_dt
            .unwrap_or_else(|| (now + Duration::days(7)).to_rfc3339_opts(SecondsFormat::Secs, true));

        let events = self
            .calendar
            .list_events(&from, &to, args.max_results)
            .await?;
        Ok(json!({"count": events.len(), "events": events}))
    }
}
