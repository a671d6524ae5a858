// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token exchange client for the upstream ALM OAuth API.
//!
//! Confidential credentials are supplied per call and never leave the
//! gateway. Upstream rejections carry the upstream status and body so
//! handlers can propagate them verbatim.

use std::time::Duration;

use reqwest::Client;

/// A normalized upstream token response. The raw body is preserved because
/// the landing page and the refresh response pass it through unchanged.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user_id: Option<String>,
    pub raw: serde_json::Value,
}

impl TokenExchange {
    fn from_body(raw: serde_json::Value) -> Self {
        let field_str = |a: &str, b: &str| {
            raw.get(a)
                .or_else(|| raw.get(b))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        let expires_in = raw
            .get("expires_in")
            .or_else(|| raw.get("expiresIn"))
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())));
        Self {
            access_token: field_str("access_token", "accessToken"),
            refresh_token: field_str("refresh_token", "refreshToken"),
            expires_in,
            user_id: field_str("user_id", "userId"),
            raw,
        }
    }
}

/// Failure modes of an upstream exchange.
#[derive(Debug)]
pub enum ExchangeError {
    /// Upstream rejected the exchange; propagated to the caller with the
    /// upstream status and body, never retried.
    Rejected { status: u16, body: serde_json::Value },
    /// The upstream could not be reached or the response not read.
    Transport(reqwest::Error),
}

impl std::fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { status, .. } => write!(f, "upstream rejected exchange ({status})"),
            Self::Transport(e) => write!(f, "upstream unreachable: {e}"),
        }
    }
}

impl std::error::Error for ExchangeError {}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// HTTP client for the upstream ALM token endpoints.
pub struct AlmClient {
    base_url: String,
    http: Client,
}

impl AlmClient {
    pub fn new(base_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<TokenExchange, ExchangeError> {
        let endpoint = format!("{}/oauth/token", self.base_url);
        self.exchange(
            &endpoint,
            &[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
            ],
        )
        .await
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn exchange_refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenExchange, ExchangeError> {
        let endpoint = format!("{}/oauth/token/refresh", self.base_url);
        self.exchange(
            &endpoint,
            &[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }

    async fn exchange(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenExchange, ExchangeError> {
        let resp = self.http.post(endpoint).form(form).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        // Non-JSON bodies are wrapped rather than dropped.
        let body: serde_json::Value = serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": text }));

        if !status.is_success() {
            tracing::error!(status = %status, endpoint = %endpoint, "upstream token exchange failed");
            return Err(ExchangeError::Rejected { status: status.as_u16(), body });
        }
        Ok(TokenExchange::from_body(body))
    }
}

#[cfg(test)]
#[path = "upstream_tests.rs"]
mod tests;
