// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Configuration for the almgate token gateway.
#[derive(Debug, Clone, clap::Parser)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "ALMGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9680, env = "ALMGATE_PORT")]
    pub port: u16,

    /// Confidential client id for the upstream ALM API.
    #[arg(long, env = "ALM_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Confidential client secret for the upstream ALM API.
    #[arg(long, env = "ALM_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Upstream ALM base URL.
    #[arg(long, default_value = "https://captivateprime.adobe.com", env = "ALM_BASE_URL")]
    pub base_url: String,

    /// Directory for the persisted refresh-token store.
    #[arg(long, env = "ALMGATE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

impl GatewayConfig {
    /// Base URL with any trailing slash stripped.
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_owned()
    }

    /// Confidential credentials, or `None` when either half is missing.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id, secret))
            }
            _ => None,
        }
    }

    /// Resolve the state directory for gateway data.
    ///
    /// Explicit config, then `$XDG_STATE_HOME/almgate`, then
    /// `$HOME/.local/state/almgate`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("almgate");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/almgate");
        }
        PathBuf::from(".almgate")
    }
}
