// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::storage::{KeyValueStore, MemoryStore};

/// Store whose every operation fails, standing in for disabled storage.
struct FailingStore;

impl KeyValueStore for FailingStore {
    fn read(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("storage disabled")
    }
    fn write(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("storage disabled")
    }
    fn remove(&self, _key: &str) -> anyhow::Result<()> {
        anyhow::bail!("storage disabled")
    }
}

fn memory_cache(scope: TokenScope) -> TokenCache {
    TokenCache::new(Arc::new(MemoryStore::new()), scope)
}

#[test]
fn set_then_get_round_trips() -> anyhow::Result<()> {
    let cache = memory_cache(TokenScope::Global);
    let before = crate::epoch_ms();
    cache.set("course:1", "tok", 100);
    let cached = cache.get("course:1").ok_or_else(|| anyhow::anyhow!("no token"))?;
    assert_eq!(cached.value, "tok");
    // Expiry lands near now + 100s.
    assert!(cached.expires_at_ms >= before + 100_000);
    assert!(cached.expires_at_ms <= crate::epoch_ms() + 100_000);
    Ok(())
}

#[test]
fn global_scope_shares_across_resources() -> anyhow::Result<()> {
    let cache = memory_cache(TokenScope::Global);
    cache.set("course:1", "tok", 100);
    let cached = cache.get("course:2").ok_or_else(|| anyhow::anyhow!("no token"))?;
    assert_eq!(cached.value, "tok");
    Ok(())
}

#[test]
fn per_resource_scope_isolates() {
    let cache = memory_cache(TokenScope::PerResource);
    cache.set("course:1", "tok", 100);
    assert!(cache.get("course:1").is_some());
    assert!(cache.get("course:2").is_none());
}

#[test]
fn unparsable_expiry_means_absent() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.write(ACCESS_TOKEN_KEY, "tok")?;
    store.write(TOKEN_EXPIRY_KEY, "not-a-number")?;
    let cache = TokenCache::new(store, TokenScope::Global);
    assert!(cache.get("r").is_none());
    Ok(())
}

#[test]
fn missing_expiry_means_absent() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.write(ACCESS_TOKEN_KEY, "tok")?;
    let cache = TokenCache::new(store, TokenScope::Global);
    assert!(cache.get("r").is_none());
    Ok(())
}

#[test]
fn clear_removes_token_and_expiry() {
    let cache = memory_cache(TokenScope::Global);
    cache.set("r", "tok", 100);
    cache.clear("r");
    assert!(cache.get("r").is_none());
}

#[test]
fn absurd_lifetime_saturates_instead_of_overflowing() -> anyhow::Result<()> {
    let cache = memory_cache(TokenScope::Global);
    cache.set("r", "tok", u64::MAX);
    let cached = cache.get("r").ok_or_else(|| anyhow::anyhow!("no token"))?;
    assert_eq!(cached.expires_at_ms, u64::MAX);
    assert!(crate::validity::is_valid(&cached, crate::epoch_ms()));
    assert_eq!(expires_at(u64::MAX, 1), u64::MAX);
    Ok(())
}

#[test]
fn failing_store_degrades_to_absent() {
    let cache = TokenCache::new(Arc::new(FailingStore), TokenScope::Global);
    // None of these may panic or propagate.
    cache.set("r", "tok", 100);
    assert!(cache.get("r").is_none());
    cache.clear("r");
}

#[test]
fn failing_store_still_yields_correlation_id() {
    let cache = TokenCache::new(Arc::new(FailingStore), TokenScope::Global);
    assert!(!cache.correlation_id().is_empty());
}

#[test]
fn correlation_id_is_reused_until_cleared() {
    let cache = memory_cache(TokenScope::Global);
    let first = cache.correlation_id();
    assert_eq!(cache.correlation_id(), first);
    cache.clear_correlation_id();
    assert_ne!(cache.correlation_id(), first);
}
