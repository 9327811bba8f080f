//! Google Calendar v3 client

use std::sync::Arc;

use serde_json::{json, Value};

use super::ServiceError;
use crate::auth::TokenProvider;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Events insert/list on a single calendar (the account's primary one
/// unless configured otherwise).
pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    calendar_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl CalendarClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            calendar_id: "primary".to_string(),
            tokens,
        }
    }

    /// Override the API base URL (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }

    /// Insert an event; times are RFC3339 in UTC
    pub async fn create_event(
        &self,
        title: &str,
        start: &str,
        end: &str,
        description: Option<&str>,
    ) -> Result<Value, ServiceError> {
        let token = self.tokens.bearer_token().await?;
        let body = json!({
            "summary": title,
            "description": description.unwrap_or(""),
            "start": {"dateTime": start, "timeZone": "UTC"},
            "end": {"dateTime": end, "timeZone": "UTC"},
        });

        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let event: Value = response.json().await?;
        Ok(json!({
            "event_id": event["id"],
            "html_link": event.get("htmlLink").cloned().unwrap_or(Value::Null),
        }))
    }

    /// List events in a window, expanded to single instances in start order
    pub async fn list_events(
        &self,
        time_min: &str,
        time_max: &str,
        max_results: u32,
    ) -> Result<Vec<Value>, ServiceError> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min),
                ("timeMax", time_max),
                ("maxResults", &max_results.to_string()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let body: Value = response.json().await?;
        let events = body["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|event| {
                        // All-day events carry "date" instead of "dateTime".
                        let start = event["start"]["dateTime"]
                            .as_str()
                            .or(event["start"]["date"].as_str())
                            .unwrap_or_default();
                        let end = event["end"]["dateTime"]
                            .as_str()
                            .or(event["end"]["date"].as_str())
                            .unwrap_or_default();
                        json!({
                            "id": event["id"],
                            "title": event["summary"].as_str().unwrap_or("No title"),
                            "start": start,
                            "end": end,
                            "description": event["description"].as_str().unwrap_or(""),
                            "location": event.get("location").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn client(server: &Server) -> CalendarClient {
        CalendarClient::new(Arc::new(StaticToken("tok".into()))).with_base_url(server.url_str(""))
    }

    #[tokio::test]
    async fn test_create_event_returns_id() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/calendars/primary/events"),
                request::headers(contains(("authorization", "Bearer tok"))),
            ])
            .respond_with(json_encoded(json!({
                "id": "evt1",
                "htmlLink": "https://calendar.google.com/evt1"
            }))),
        );

        let created = client(&server)
            .create_event(
                "Dentist",
                "2026-09-01T10:00:00Z",
                "2026-09-01T11:00:00Z",
                None,
            )
            .await
            .unwrap();
        assert_eq!(created["event_id"], "evt1");
    }

    #[tokio::test]
    async fn test_list_events_handles_all_day() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/calendars/primary/events"))
                .respond_with(json_encoded(json!({
                    "items": [
                        {
                            "id": "e1",
                            "summary": "Bin day",
                            "start": {"date": "2026-09-02"},
                            "end": {"date": "2026-09-03"}
                        }
                    ]
                }))),
        );

        let events = client(&server)
            .list_events("2026-09-01T00:00:00Z", "2026-09-08T00:00:00Z", 50)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["start"], "2026-09-02");
        assert_eq!(events[0]["title"], "Bin day");
    }

    #[tokio::test]
    async fn test_unauthenticated_provider_skips_request() {
        let server = Server::run();
        let unauth =
            CalendarClient::new(Arc::new(StaticToken(String::new()))).with_base_url(server.url_str(""));
        let err = unauth
            .list_events("2026-09-01T00:00:00Z", "2026-09-08T00:00:00Z", 50)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthenticated(_)));
    }
}
