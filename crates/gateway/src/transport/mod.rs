// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the token gateway.

pub mod cors;
pub mod oauth;
pub mod refresh;

use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /api/v1/health`
pub async fn health(State(_s): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(HealthResponse { status: "running".to_owned() })
}

/// Build the axum `Router` with all gateway routes.
///
/// The two token routes are siblings under one parent path so a client
/// holding the issuance URL can derive the refresh URL by swapping the
/// last path segment.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/alm-oauth", get(oauth::alm_oauth))
        .route("/api/v1/alm-refresh", post(refresh::alm_refresh))
        .layer(middleware::from_fn(cors::cors_layer))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
