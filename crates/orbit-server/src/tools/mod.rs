//! Tool implementations binding external services to the registry

pub mod banking;
pub mod calendar;
pub mod groceries;
pub mod home;
pub mod tasks;

use std::sync::Arc;

use orbit_agent::ToolRegistry;

use crate::auth::RefreshingToken;
use crate::config::Config;
use crate::services::{
    CalendarClient, HomeAssistantClient, OpenBankingClient, SupabaseClient,
};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

fn truelayer_token_url(environment: &str) -> &'static str {
    if environment == "live" {
        "https://auth.truelayer.com/connect/token"
    } else {
        "https://auth.truelayer-sandbox.com/connect/token"
    }
}

/// Build the tool registry from the configured services.
///
/// Tool families whose backing service is not configured are left out, so
/// the model never sees a tool it cannot use.
pub fn build_registry(config: &Config) -> ToolRegistry {
    let mut builder = ToolRegistry::builder();

    if let Some(supabase) = &config.supabase {
        let client = Arc::new(SupabaseClient::new(&supabase.url, &supabase.service_key));
        builder = builder
            .register(Arc::new(groceries::AddToGroceries::new(client.clone())))
            .register(Arc::new(groceries::UpdateGroceryStatus::new(client.clone())))
            .register(Arc::new(groceries::ListGroceries::new(client.clone())))
            .register(Arc::new(tasks::CreateTask::new(client.clone())))
            .register(Arc::new(tasks::UpdateTaskStatus::new(client.clone())))
            .register(Arc::new(tasks::ListTasks::new(client)));
    } else {
        tracing::warn!("supabase not configured, grocery and task tools disabled");
    }

    if let Some(google) = &config.google {
        let tokens = Arc::new(RefreshingToken::new(
            GOOGLE_TOKEN_URL,
            &google.client_id,
            &google.client_secret,
            &google.refresh_token,
        ));
        let client = Arc::new(CalendarClient::new(tokens));
        builder = builder
            .register(Arc::new(calendar::CreateEvent::new(client.clone())))
            .register(Arc::new(calendar::ListCalendarEvents::new(client)));
    } else {
        tracing::warn!("google not configured, calendar tools disabled");
    }

    if let Some(truelayer) = &config.truelayer {
        let tokens = Arc::new(RefreshingToken::new(
            truelayer_token_url(&truelayer.environment),
            &truelayer.client_id,
            &truelayer.client_secret,
            &truelayer.refresh_token,
        ));
        let client = Arc::new(OpenBankingClient::new(&truelayer.environment, tokens));
        builder = builder
            .register(Arc::new(banking::GetTransactions::new(client.clone())))
            .register(Arc::new(banking::BudgetScan::new(
                client,
                config.budget.categories.clone(),
            )));
    } else {
        tracing::warn!("truelayer not configured, banking and budget tools disabled");
    }

    if let Some(home_assistant) = &config.home_assistant {
        let client = Arc::new(HomeAssistantClient::new(
            &home_assistant.base_url,
            &home_assistant.token,
        ));
        builder = builder.register(Arc::new(home::HaServiceCall::new(client)));
    } else {
        tracing::warn!("home assistant not configured, ha_service_call disabled");
    }

    let registry = builder.build();
    tracing::info!(tools = ?registry.names(), "registered tools");
    registry
}
