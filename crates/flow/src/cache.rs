// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side token cache over a pluggable key/value store.
//!
//! Every storage operation is wrapped so a disabled or quota-exceeded store
//! degrades to "no token" instead of propagating an error. A missing or
//! unparsable expiry makes the token absent; a stale token is never handed
//! out.

use std::sync::Arc;

use crate::epoch_ms;
use crate::storage::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "alm-access-token";
pub const TOKEN_EXPIRY_KEY: &str = "alm-access-token-expiry";
pub const CORRELATION_ID_KEY: &str = "alm-correlation-id";

/// How cached tokens are keyed.
///
/// `Global` matches the deployed player widget: one token per browser
/// profile. `PerResource` namespaces keys by resource id for embedders
/// that mix tenants on one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenScope {
    #[default]
    Global,
    PerResource,
}

/// A cached access token with its absolute expiry (epoch ms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at_ms: u64,
}

pub struct TokenCache {
    store: Arc<dyn KeyValueStore>,
    scope: TokenScope,
}

impl TokenCache {
    pub fn new(store: Arc<dyn KeyValueStore>, scope: TokenScope) -> Self {
        Self { store, scope }
    }

    fn key(&self, base: &str, resource_id: &str) -> String {
        match self.scope {
            TokenScope::Global => base.to_owned(),
            TokenScope::PerResource => format!("{base}:{resource_id}"),
        }
    }

    /// Read the cached token for a resource. Absent on any storage failure,
    /// missing expiry, or unparsable expiry.
    pub fn get(&self, resource_id: &str) -> Option<CachedToken> {
        let value = self.read(&self.key(ACCESS_TOKEN_KEY, resource_id))?;
        let expiry = self.read(&self.key(TOKEN_EXPIRY_KEY, resource_id))?;
        let expires_at_ms: u64 = expiry.parse().ok()?;
        Some(CachedToken { value, expires_at_ms })
    }

    /// Cache a token, overwriting any prior value. Expiry is stored as
    /// absolute epoch ms derived from `expires_in_secs`. Saturating: the
    /// lifetime comes from untrusted payloads and may not overflow.
    pub fn set(&self, resource_id: &str, token: &str, expires_in_secs: u64) {
        let expires_at_ms = expires_at(epoch_ms(), expires_in_secs);
        self.write(&self.key(ACCESS_TOKEN_KEY, resource_id), token);
        self.write(&self.key(TOKEN_EXPIRY_KEY, resource_id), &expires_at_ms.to_string());
    }

    /// Drop the cached token and its expiry.
    pub fn clear(&self, resource_id: &str) {
        self.remove(&self.key(ACCESS_TOKEN_KEY, resource_id));
        self.remove(&self.key(TOKEN_EXPIRY_KEY, resource_id));
    }

    /// The correlation id binding popup flows to server-side refresh
    /// lookups. Created lazily, then reused until cleared. If the store
    /// refuses the write the generated id is still returned so the current
    /// flow can proceed.
    pub fn correlation_id(&self) -> String {
        if let Some(id) = self.read(CORRELATION_ID_KEY) {
            return id;
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.write(CORRELATION_ID_KEY, &id);
        id
    }

    pub fn clear_correlation_id(&self) {
        self.remove(CORRELATION_ID_KEY);
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.read(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key = %key, err = %e, "token store read failed");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.write(key, value) {
            tracing::debug!(key = %key, err = %e, "token store write failed");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::debug!(key = %key, err = %e, "token store remove failed");
        }
    }
}

/// Absolute expiry (epoch ms) for a lifetime in seconds, saturating at
/// `u64::MAX` for absurd lifetimes.
pub fn expires_at(now_ms: u64, expires_in_secs: u64) -> u64 {
    now_ms.saturating_add(expires_in_secs.saturating_mul(1000))
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
