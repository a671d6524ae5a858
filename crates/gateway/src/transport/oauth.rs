// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token issuance: authorize redirect, code exchange, landing page.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::state::GatewayState;
use crate::upstream::{ExchangeError, TokenExchange};

/// Message type tag the landing page posts to `window.opener`.
pub const TOKEN_MESSAGE_TYPE: &str = "oauth-token";

const DEFAULT_SCOPE: &str = "learner:read,learner:write";
const DEFAULT_STATE: &str = "state1";

#[derive(Debug, Default, Deserialize)]
pub struct OauthParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// `GET /api/v1/alm-oauth`
///
/// Without `code` or `refresh_token`: 302 to the upstream authorize URL.
/// With either: exchange it, persist the resulting refresh token, and
/// return the HTML landing page that posts the token to `window.opener`.
pub async fn alm_oauth(
    State(s): State<Arc<GatewayState>>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<OauthParams>,
) -> Response {
    let Some((client_id, client_secret)) = s.config.credentials() else {
        return GatewayError::Config
            .to_http_response("Missing ALM client credentials in gateway config")
            .into_response();
    };

    if params.code.is_none() && params.refresh_token.is_none() {
        return authorize_redirect(&s, client_id, &headers, uri.path(), &params);
    }

    let result = if let Some(code) = params.code.as_deref() {
        s.alm.exchange_code(client_id, client_secret, code).await
    } else if let Some(token) = params.refresh_token.as_deref() {
        s.alm.exchange_refresh(client_id, client_secret, token).await
    } else {
        return GatewayError::BadRequest
            .to_http_response("Missing code or refresh_token")
            .into_response();
    };

    let exchange = match result {
        Ok(exchange) => exchange,
        Err(ExchangeError::Rejected { status, body }) => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(body)).into_response();
        }
        Err(e @ ExchangeError::Transport(_)) => {
            return GatewayError::Internal.to_http_response(e.to_string()).into_response();
        }
    };

    // Email param wins over the upstream-reported user id.
    let identity = params.email.clone().or_else(|| exchange.user_id.clone());
    persist_refresh_token(&s, &exchange, identity.as_deref(), params.state.as_deref()).await;

    let identity_json = match &identity {
        Some(value) => serde_json::json!({
            "type": if params.email.is_some() { "email" } else { "user_id" },
            "value": value,
        }),
        None => serde_json::Value::Null,
    };
    let mut payload = exchange.raw.clone();
    if let Some(obj) = payload.as_object_mut() {
        // Refresh tokens stay server-side.
        obj.remove("refresh_token");
        obj.remove("refreshToken");
        obj.insert("identity".to_owned(), identity_json);
    }

    Html(landing_page(&payload)).into_response()
}

fn authorize_redirect(
    s: &GatewayState,
    client_id: &str,
    headers: &HeaderMap,
    own_path: &str,
    params: &OauthParams,
) -> Response {
    let redirect_uri = match params.redirect_uri.clone() {
        Some(uri) => uri,
        None => match self_url(headers, own_path) {
            Some(url) => url,
            None => {
                return GatewayError::Config
                    .to_http_response("Missing host header in gateway request")
                    .into_response();
            }
        },
    };

    let scope = params.scope.as_deref().unwrap_or(DEFAULT_SCOPE);
    let state = params.state.as_deref().unwrap_or(DEFAULT_STATE);

    let mut query = vec![
        ("client_id", client_id),
        ("redirect_uri", redirect_uri.as_str()),
        ("scope", scope),
        ("response_type", "CODE"),
        ("state", state),
    ];
    if let Some(account) = params.account.as_deref() {
        query.push(("account", account));
    }
    if let Some(email) = params.email.as_deref() {
        query.push(("email", email));
    }

    let location =
        format!("{}/oauth/o/authorize?{}", s.alm.base_url(), urlencoded(&query));
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Reconstruct this endpoint's externally visible URL from proxy headers.
///
/// Fallback order matches what front proxies actually send: forwarded
/// headers first, then the plain `Host`/request path.
fn self_url(headers: &HeaderMap, own_path: &str) -> Option<String> {
    let header = |name: &str| {
        headers.get(name).and_then(|v| v.to_str().ok()).filter(|s| !s.is_empty())
    };
    let proto = header("x-forwarded-proto").unwrap_or("https");
    let host = header("x-forwarded-host").or_else(|| header("x-original-host")).or_else(|| {
        header("host")
    })?;
    let path = header("x-forwarded-uri")
        .or_else(|| header("x-original-uri"))
        .or_else(|| header("x-forwarded-path"))
        .unwrap_or(own_path);
    Some(format!("{proto}://{host}{path}"))
}

/// Store the rotated refresh token under every key a later refresh may
/// look it up by. Persist failures are logged and swallowed: issuance
/// already succeeded from the caller's point of view.
async fn persist_refresh_token(
    s: &GatewayState,
    exchange: &TokenExchange,
    identity: Option<&str>,
    state: Option<&str>,
) {
    let Some(refresh_token) = exchange.refresh_token.as_deref() else {
        return;
    };
    let mut stored = false;
    for key in [identity, state].into_iter().flatten() {
        stored = true;
        if let Err(e) = s.store.put(Some(key), refresh_token).await {
            tracing::warn!(err = %e, "failed to store refresh token");
        }
    }
    if !stored {
        if let Err(e) = s.store.put(None, refresh_token).await {
            tracing::warn!(err = %e, "failed to store refresh token");
        }
    }
}

fn landing_page(payload: &serde_json::Value) -> String {
    let payload = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_owned());
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>ALM OAuth Token</title>
    <style>
      body {{ font-family: Arial, sans-serif; padding: 24px; }}
      code {{ display: block; padding: 12px; background: #f4f4f4; border: 1px solid #ddd; word-break: break-all; }}
    </style>
  </head>
  <body>
    <h1>Access Token</h1>
    <p>Copy the token below and use it in the ALM block.</p>
    <code id="token">Loading...</code>
    <script>
      const payload = {payload};
      const tokenEl = document.getElementById('token');
      tokenEl.textContent = payload.access_token || payload.accessToken || 'No access_token in response';
      if (window.opener && window.opener !== window) {{
        try {{
          window.opener.postMessage({{ type: '{TOKEN_MESSAGE_TYPE}', payload }}, '*');
          setTimeout(() => {{
            try {{ window.close(); }} catch (e) {{}}
          }}, 500);
        }} catch (e) {{}}
      }}
    </script>
  </body>
</html>"#
    )
}

/// Build a URL-encoded query string.
pub fn urlencoded(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding(k), urlencoding(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencoding(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                char::from(b).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
