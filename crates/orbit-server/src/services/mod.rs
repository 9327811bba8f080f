//! Thin clients for the external services behind the tools

pub mod calendar;
pub mod home_assistant;
pub mod open_banking;
pub mod supabase;

pub use calendar::CalendarClient;
pub use home_assistant::HomeAssistantClient;
pub use open_banking::OpenBankingClient;
pub use supabase::SupabaseClient;

use orbit_agent::ToolError;

/// Errors surfaced by the service clients
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServiceError {
    /// Build an `Upstream` error from a non-success response, consuming it
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::Upstream { status, body }
    }
}

impl From<ServiceError> for ToolError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(msg) => ToolError::NotFound(msg),
            other => ToolError::Upstream(other.to_string()),
        }
    }
}
