//! Banking and budget tools backed by Open Banking transactions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use orbit_agent::{Tool, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::budget::{self, CategoryCap, Period};
use crate::services::OpenBankingClient;

/// Resolve `(account_id, from, to)` applying the tool defaults: first
/// available account, last 90 days, and a `to` date clamped to today.
async fn resolve_window(
    banking: &OpenBankingClient,
    account_id: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
) -> Result<(String, String, String), ToolError> {
    let account_id = match account_id {
        Some(id) => id,
        None => {
            let accounts = banking.accounts().await?;
            accounts
                .first()
                .and_then(|a| a["id"].as_str())
                .map(|id| id.to_string())
                .ok_or_else(|| ToolError::NotFound("No bank accounts available".to_string()))?
        }
    };

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let from = from_date
        .unwrap_or_else(|| (Utc::now() - Duration::days(90)).format("%Y-%m-%d").to_string());
    // The upstream API rejects future dates.
    let to = match to_date {
        Some(to) if to <= today => to,
        Some(_) | None => today,
    };

    Ok((account_id, from, to))
}

#[derive(Deserialize)]
struct GetTransactionsArgs {
    account_id: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

pub struct GetTransactions {
    banking: Arc<OpenBankingClient>,
}

impl GetTransactions {
    pub fn new(banking: Arc<OpenBankingClient>) -> Self {
        Self { banking }
    }
}

#[async_trait]
impl Tool for GetTransactions {
    fn name(&self) -> &str {
        "get_transactions"
    }

    fn description(&self) -> &str {
        "Fetch real bank transactions from the Open Banking API. Returns recent \
         spending data with merchant names, amounts, categories, and timestamps. Use \
         this to answer questions about spending habits, budgets, and financial \
         patterns."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "account_id": {
                    "type": "string",
                    "description": "Bank account ID to fetch transactions from (optional - if not provided, uses first available account)"
                },
                "from_date": {
                    "type": "string",
                    "description": "Start date in YYYY-MM-DD format (optional, defaults to 90 days ago)"
                },
                "to_date": {
                    "type": "string",
                    "description": "End date in YYYY-MM-DD format (optional, defaults to today)"
                }
            },
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: GetTransactionsArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let (account_id, from, to) =
            resolve_window(&self.banking, args.account_id, args.from_date, args.to_date).await?;
        let transactions = self.banking.transactions(&account_id, &from, &to).await?;

        Ok(json!({
            "account_id": account_id,
            "from_date": from,
            "to_date": to,
            "count": transactions.len(),
            "transactions": transactions,
        }))
    }
}

#[derive(Deserialize)]
struct BudgetScanArgs {
    period: Period,
}

pub struct BudgetScan {
    banking: Arc<OpenBankingClient>,
    caps: Vec<CategoryCap>,
}

impl BudgetScan {
    pub fn new(banking: Arc<OpenBankingClient>, caps: Vec<CategoryCap>) -> Self {
        Self { banking, caps }
    }
}

#[async_trait]
impl Tool for BudgetScan {
    fn name(&self) -> &str {
        "budget_scan"
    }

    fn description(&self) -> &str {
        "Scan budget summarizing categories and buffer for a date period."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "period": {
                    "type": "object",
                    "properties": {
                        "from": {"type": "string", "description": "YYYY-MM-DD"},
                        "to": {"type": "string", "description": "YYYY-MM-DD"}
                    },
                    "required": ["from", "to"]
                }
            },
            "required": ["period"],
            "additionalProperties": false
        })
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: BudgetScanArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::validation("arguments", e.to_string()))?;

        let (account_id, from, to) = resolve_window(
            &self.banking,
            None,
            Some(args.period.from.clone()),
            Some(args.period.to.clone()),
        )
        .await?;
        let transactions = self.banking.transactions(&account_id, &from, &to).await?;

        let report = budget::summarize(&transactions, &self.caps, args.period);
        serde_json::to_value(&report)
            .map_err(|e| ToolError::Upstream(format!("failed to encode report: {}", e)))
    }
}
