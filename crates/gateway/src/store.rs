// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable refresh-token store.
//!
//! Keyed by identity (or a fixed shared key when none is known), 30-day
//! TTL, persisted as JSON with atomic tmp+rename writes. Refresh tokens
//! never leave this process: only access tokens cross to the browser.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Fixed key used when no identity or correlation was supplied.
pub const REFRESH_TOKEN_KEY: &str = "alm-refresh-token";

/// Stored refresh tokens expire after 30 days untouched.
pub const REFRESH_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    refresh_token: String,
    /// Expiry as epoch seconds.
    expires_at: u64,
}

pub struct RefreshTokenStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, StoredToken>>,
}

impl RefreshTokenStore {
    /// Open the store under `dir`. A missing or unreadable file starts it
    /// empty; storage trouble is never fatal to the gateway.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("refresh-tokens.json");
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(err = %e, "malformed refresh-token store, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, entries: RwLock::new(entries) }
    }

    fn key_for(identity: Option<&str>) -> String {
        match identity {
            Some(id) => format!("{REFRESH_TOKEN_KEY}:{id}"),
            None => REFRESH_TOKEN_KEY.to_owned(),
        }
    }

    /// Store (or rotate) the refresh token for an identity, restarting its
    /// 30-day TTL. Last write wins under concurrent refreshes.
    pub async fn put(&self, identity: Option<&str>, refresh_token: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            Self::key_for(identity),
            StoredToken {
                refresh_token: refresh_token.to_owned(),
                expires_at: epoch_secs() + REFRESH_TOKEN_TTL_SECS,
            },
        );
        self.save(&entries)
    }

    /// Look up the refresh token for an identity. Expired entries are
    /// removed on read.
    pub async fn get(&self, identity: Option<&str>) -> Option<String> {
        let key = Self::key_for(identity);
        let mut entries = self.entries.write().await;
        match entries.get(&key) {
            Some(stored) if stored.expires_at > epoch_secs() => {
                Some(stored.refresh_token.clone())
            }
            Some(_) => {
                entries.remove(&key);
                if let Err(e) = self.save(&entries) {
                    tracing::warn!(err = %e, "failed to persist store after pruning");
                }
                None
            }
            None => None,
        }
    }

    #[cfg(test)]
    pub(crate) async fn put_with_expiry(
        &self,
        identity: Option<&str>,
        refresh_token: &str,
        expires_at: u64,
    ) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            Self::key_for(identity),
            StoredToken { refresh_token: refresh_token.to_owned(), expires_at },
        );
        self.save(&entries)
    }

    /// Save to a unique temp file then rename. The PID+counter tmp name
    /// keeps concurrent saves from racing on one `.tmp` file.
    fn save(&self, entries: &HashMap<String, StoredToken>) -> anyhow::Result<()> {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
