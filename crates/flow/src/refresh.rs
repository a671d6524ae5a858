// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Silent refresh client.
//!
//! The refresh endpoint is derived from the authorization endpoint by
//! replacing its last path segment with [`REFRESH_SEGMENT`] and stripping
//! the query. The call is safe to issue speculatively: any failure is
//! absorbed into `None`.

use std::time::Duration;

use crate::grant::TokenGrant;

/// Fixed final path segment of the server-side refresh action.
pub const REFRESH_SEGMENT: &str = "alm-refresh";

/// Derive the refresh URL from an authorization endpoint.
///
/// `https://host/a/b/auth` becomes `https://host/a/b/alm-refresh` with no
/// query string. An endpoint without a path yields `None`.
pub fn derive_refresh_url(auth_endpoint: &str) -> Option<String> {
    let rest = auth_endpoint.split_once("://").map(|(_, r)| r)?;
    let scheme_len = auth_endpoint.len() - rest.len();

    // Strip query and fragment before touching path segments.
    let end = auth_endpoint
        .find('?')
        .into_iter()
        .chain(auth_endpoint.find('#'))
        .min()
        .unwrap_or(auth_endpoint.len());
    let trimmed = &auth_endpoint[..end];

    let path_start = trimmed[scheme_len..].find('/').map(|i| scheme_len + i)?;
    let origin = &trimmed[..path_start];
    let mut segments: Vec<&str> =
        trimmed[path_start..].split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.last_mut()?;
    *last = REFRESH_SEGMENT;
    Some(format!("{}/{}", origin, segments.join("/")))
}

pub struct RefreshClient {
    http: reqwest::Client,
}

impl Default for RefreshClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchange a correlation id for a fresh access token.
    ///
    /// POST with no body; the correlation id rides as the `state` query
    /// parameter for the server-side lookup. Non-success status, network
    /// error, or malformed response all yield `None`.
    pub async fn refresh(
        &self,
        auth_endpoint: &str,
        correlation_id: Option<&str>,
    ) -> Option<TokenGrant> {
        let url = derive_refresh_url(auth_endpoint)?;
        let mut req = self.http.post(&url);
        if let Some(id) = correlation_id {
            req = req.query(&[("state", id)]);
        }
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(err = %e, "silent refresh unreachable");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "silent refresh rejected");
            return None;
        }
        let body: serde_json::Value = resp.json().await.ok()?;
        TokenGrant::from_payload(&body)
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
