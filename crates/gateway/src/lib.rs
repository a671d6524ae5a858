// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! almgate: confidential token gateway for the ALM OAuth flow.
//!
//! Holds the client id/secret and the persisted refresh tokens, and
//! exposes the two browser-facing endpoints the almflow client talks to:
//! `/api/v1/alm-oauth` (authorize redirect + code exchange + landing
//! page) and `/api/v1/alm-refresh` (silent refresh with rotation).

pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod transport;
pub mod upstream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::state::GatewayState;
use crate::store::RefreshTokenStore;
use crate::transport::build_router;
use crate::upstream::AlmClient;

/// Install the ring crypto provider for reqwest/rustls.
/// Needed even for plain-HTTP mock servers.
#[cfg(test)]
pub(crate) fn ensure_crypto() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Run the gateway server until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let store = RefreshTokenStore::open(&config.state_dir());
    let alm = AlmClient::new(config.normalized_base_url());

    if config.credentials().is_none() {
        tracing::warn!("no ALM client credentials configured; token routes will return 500");
    }

    let state = Arc::new(GatewayState::new(config, store, alm));
    let router = build_router(state);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    tracing::info!("almgate listening on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
