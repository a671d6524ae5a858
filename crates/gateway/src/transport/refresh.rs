// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refresh service: exchange a stored refresh token, rotate it, return
//! the upstream body. The refresh token itself never crosses to the
//! caller.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::state::GatewayState;
use crate::upstream::ExchangeError;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Correlation id minted by the client for its popup flow.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /api/v1/alm-refresh`
pub async fn alm_refresh(
    State(s): State<Arc<GatewayState>>,
    Query(params): Query<RefreshParams>,
) -> Response {
    let Some((client_id, client_secret)) = s.config.credentials() else {
        return GatewayError::Config
            .to_http_response("Missing ALM client credentials in gateway config")
            .into_response();
    };

    // Lookup order: explicit identity, then the popup correlation id,
    // then the fixed shared key.
    let keys = [params.email.as_deref(), params.state.as_deref(), None];
    let mut found = None;
    for key in dedup_keys(&keys) {
        if let Some(token) = s.store.get(key).await {
            found = Some((key, token));
            break;
        }
    }
    let Some((matched_key, refresh_token)) = found else {
        return GatewayError::AuthRequired
            .to_http_response("Missing refresh token. Please authenticate again.")
            .into_response();
    };

    let exchange =
        match s.alm.exchange_refresh(client_id, client_secret, &refresh_token).await {
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

    // Rotate under the key that matched.
    if let Some(rotated) = exchange.refresh_token.as_deref() {
        if let Err(e) = s.store.put(matched_key, rotated).await {
            tracing::warn!(err = %e, "failed to rotate refresh token");
        }
    }

    let mut body = exchange.raw;
    if let Some(obj) = body.as_object_mut() {
        obj.remove("refresh_token");
        obj.remove("refreshToken");
    }
    (StatusCode::OK, Json(body)).into_response()
}

/// Drop later keys that repeat an earlier one, preserving order.
fn dedup_keys<'a>(keys: &'a [Option<&'a str>]) -> Vec<Option<&'a str>> {
    let mut out: Vec<Option<&str>> = Vec::with_capacity(keys.len());
    for key in keys {
        if !out.contains(key) {
            out.push(*key);
        }
    }
    out
}
