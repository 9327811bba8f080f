//! Bearer-token acquisition for OAuth-backed services

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::services::ServiceError;

/// Source of a valid bearer token for an upstream API.
///
/// Consent flows are out of scope; credentials arrive through configuration
/// and implementations only exchange or return them.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, ServiceError>;
}

/// A fixed token taken directly from configuration (long-lived tokens,
/// e.g. Home Assistant)
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, ServiceError> {
        if self.0.is_empty() {
            return Err(ServiceError::NotAuthenticated(
                "no access token configured".to_string(),
            ));
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth refresh-token exchanger with an in-memory cache.
///
/// Exchanges the configured refresh token for an access token on first use
/// and again once the cached token is within a minute of expiry.
pub struct RefreshingToken {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshingToken {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            cached: Mutex::new(None),
        }
    }

    async fn refresh(&self) -> Result<CachedToken, ServiceError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "token refresh rejected");
            return Err(ServiceError::NotAuthenticated(format!(
                "token refresh failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(3600);
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }
}

#[async_trait]
impl TokenProvider for RefreshingToken {
    async fn bearer_token(&self) -> Result<String, ServiceError> {
        if self.refresh_token.is_empty() {
            return Err(ServiceError::NotAuthenticated(
                "no refresh token configured".to_string(),
            ));
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.refresh().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        tracing::debug!("refreshed access token");
        Ok(access_token)
    }
}
