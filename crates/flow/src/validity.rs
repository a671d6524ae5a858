// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token validity: local expiry comparison plus optional upstream
//! introspection on the incoming path.

use crate::cache::CachedToken;

/// Local check: a token is valid strictly before its expiry.
pub fn is_valid(token: &CachedToken, now_ms: u64) -> bool {
    now_ms < token.expires_at_ms
}

/// Remote introspection against the upstream token-check endpoint.
///
/// Fails open: a network error, non-success status, or unreadable body is
/// treated as valid, so a transient outage never tears down a working
/// player. Only an explicit `error` flag in the response body fails closed.
pub async fn check_upstream(http: &reqwest::Client, base_url: &str, token: &str) -> bool {
    let url = format!("{}/oauth/token/check", base_url.trim_end_matches('/'));
    let resp = match http.get(&url).query(&[("access_token", token)]).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!(err = %e, "token introspection unreachable, failing open");
            return true;
        }
    };
    if !resp.status().is_success() {
        tracing::debug!(status = %resp.status(), "token introspection non-success, failing open");
        return true;
    }
    let body: serde_json::Value = match resp.json().await {
        Ok(body) => body,
        Err(_) => return true,
    };
    match body.get("error") {
        Some(flag) if !flag.is_null() => false,
        _ => true,
    }
}

#[cfg(test)]
#[path = "validity_tests.rs"]
mod tests;
