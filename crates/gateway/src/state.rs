// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::GatewayConfig;
use crate::store::RefreshTokenStore;
use crate::upstream::AlmClient;

/// Shared gateway state.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub store: RefreshTokenStore,
    pub alm: AlmClient,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, store: RefreshTokenStore, alm: AlmClient) -> Self {
        Self { config, store, alm }
    }
}
