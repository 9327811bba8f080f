//! TrueLayer Data API client for accounts and transactions

use std::sync::Arc;

use serde_json::{json, Value};

use super::ServiceError;
use crate::auth::TokenProvider;

/// Live transaction fetches only; nothing is stored server-side.
pub struct OpenBankingClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl OpenBankingClient {
    /// `environment` selects the TrueLayer host: "live" or "sandbox"
    pub fn new(environment: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        let base_url = if environment == "live" {
            "https://api.truelayer.com".to_string()
        } else {
            "https://api.truelayer-sandbox.com".to_string()
        };
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        }
    }

    /// Override the API base URL (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_results(&self, url: String, query: &[(&str, &str)]) -> Result<Vec<Value>, ServiceError> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let body: Value = response.json().await?;
        Ok(body["results"].as_array().cloned().unwrap_or_default())
    }

    /// Account metadata for the connected bank (no balances)
    pub async fn accounts(&self) -> Result<Vec<Value>, ServiceError> {
        let accounts = self
            .get_results(format!("{}/data/v1/accounts", self.base_url), &[])
            .await?
            .into_iter()
            .map(|account| {
                json!({
                    "id": account["account_id"],
                    "account_type": account.get("account_type").cloned().unwrap_or(Value::Null),
                    "display_name": account.get("display_name").cloned().unwrap_or(Value::Null),
                    "bank_name": account["provider"]["display_name"].clone(),
                    "currency": account["currency"].as_str().unwrap_or("GBP"),
                })
            })
            .collect();
        Ok(accounts)
    }

    /// Transactions for an account in an inclusive `YYYY-MM-DD` date range
    pub async fn transactions(
        &self,
        account_id: &str,
        from_date: &str,
        to_date: &str,
    ) -> Result<Vec<Value>, ServiceError> {
        let transactions = self
            .get_results(
                format!("{}/data/v1/accounts/{}/transactions", self.base_url, account_id),
                &[("from", from_date), ("to", to_date)],
            )
            .await?
            .into_iter()
            .map(|tx| {
                json!({
                    "transaction_id": tx["transaction_id"],
                    "timestamp": tx.get("timestamp").cloned().unwrap_or(Value::Null),
                    "description": tx["description"].as_str().unwrap_or(""),
                    "amount": tx["amount"],
                    "currency": tx["currency"].as_str().unwrap_or("GBP"),
                    "transaction_type": tx["transaction_type"],
                    "category": tx.get("transaction_category").cloned().unwrap_or(Value::Null),
                    "merchant_name": tx.get("merchant_name").cloned().unwrap_or(Value::Null),
                })
            })
            .collect();
        Ok(transactions)
    }
}
