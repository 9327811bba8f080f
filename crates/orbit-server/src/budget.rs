//! Budget summarization over fetched transactions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spend caps for one category, monthly in account currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCap {
    pub name: String,
    pub cap: f64,
}

/// Default household categories
pub fn default_caps() -> Vec<CategoryCap> {
    [
        ("Food", 140.0),
        ("Fun", 50.0),
        ("Transport", 80.0),
        ("Utilities", 120.0),
        ("Shopping", 100.0),
    ]
    .into_iter()
    .map(|(name, cap)| CategoryCap {
        name: name.to_string(),
        cap,
    })
    .collect()
}

/// Per-category totals for a scanned period
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub cap: f64,
    pub spent: f64,
    pub delta: f64,
    pub status: &'static str,
}

/// Full scan output: one summary per configured category plus the combined
/// remaining buffer
#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub period: Period,
    pub categories: Vec<CategorySummary>,
    pub buffer_remaining: f64,
}

/// Inclusive date range, `YYYY-MM-DD`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub from: String,
    pub to: String,
}

impl Period {
    fn parse(&self) -> Option<(NaiveDate, NaiveDate)> {
        let from = NaiveDate::parse_from_str(&self.from, "%Y-%m-%d").ok()?;
        let to = NaiveDate::parse_from_str(&self.to, "%Y-%m-%d").ok()?;
        Some((from, to))
    }
}

fn matches_category(tx: &Value, category: &str) -> bool {
    // Merchant name takes precedence over the bank's coarse category code.
    let merchant = tx["merchant_name"].as_str().unwrap_or("");
    let tx_category = tx["category"].as_str().unwrap_or("");
    merchant.eq_ignore_ascii_case(category) || tx_category.eq_ignore_ascii_case(category)
}

fn in_period(tx: &Value, range: Option<&(NaiveDate, NaiveDate)>) -> bool {
    let Some((from, to)) = range else {
        return true;
    };
    let Some(timestamp) = tx["timestamp"].as_str() else {
        return false;
    };
    // Timestamps are RFC3339; the leading ten characters are the date.
    match NaiveDate::parse_from_str(&timestamp[..timestamp.len().min(10)], "%Y-%m-%d") {
        Ok(date) => date >= *from && date <= *to,
        Err(_) => false,
    }
}

fn spend_amount(tx: &Value) -> f64 {
    let amount = tx["amount"].as_f64().unwrap_or(0.0);
    let is_debit = tx["transaction_type"]
        .as_str()
        .map(|t| t.eq_ignore_ascii_case("DEBIT"))
        .unwrap_or(true);
    if is_debit { amount.abs() } else { 0.0 }
}

/// Summarize transactions against category caps.
///
/// A category is flagged `WARN` once spend passes 80% of its cap;
/// `buffer_remaining` is the sum of every category's remaining delta.
pub fn summarize(transactions: &[Value], caps: &[CategoryCap], period: Period) -> BudgetReport {
    let range = period.parse();

    let categories: Vec<CategorySummary> = caps
        .iter()
        .map(|cap| {
            let spent: f64 = transactions
                .iter()
                .filter(|tx| in_period(tx, range.as_ref()))
                .filter(|tx| matches_category(tx, &cap.name))
                .map(spend_amount)
                .sum();
            let delta = cap.cap - spent;
            let status = if cap.cap > 0.0 && spent / cap.cap > 0.8 {
                "WARN"
            } else {
                "OK"
            };
            CategorySummary {
                name: cap.name.clone(),
                cap: cap.cap,
                spent,
                delta,
                status,
            }
        })
        .collect();

    let buffer_remaining = categories.iter().map(|c| c.delta).sum();
    BudgetReport {
        period,
        categories,
        buffer_remaining,
    }
}
