// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Almflow: client-side OAuth token lifecycle for embedded learning players.
//!
//! A host widget embeds a learning-content player that needs a short-lived
//! access token. This crate owns the full acquisition path: cached token
//! with expiry, silent refresh against an almgate deployment, and the
//! interactive popup bridge with bounded polling. The embedder supplies
//! storage, the authorization endpoint, and the popup itself; everything
//! else lives here.

pub mod cache;
pub mod endpoint;
pub mod flow;
pub mod grant;
pub mod poll;
pub mod refresh;
pub mod storage;
pub mod validity;

/// Install the ring crypto provider for reqwest/rustls.
/// Needed even for plain-HTTP mock servers.
#[cfg(test)]
pub(crate) fn ensure_crypto() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
