// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth flow orchestrator: cache check, silent refresh, interactive popup
//! bridge with bounded polling.
//!
//! One [`AuthFlow`] per widget instance. The embedder renders prompts and
//! opens popups in response to [`FlowEvent`]s and feeds popup messages back
//! through [`AuthFlow::deliver_message`]; the orchestrator owns everything
//! else, including the guarantee that an interactive flow resolves exactly
//! once no matter which path (message, poll, ceiling) fires first.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::cache::{TokenCache, TokenScope};
use crate::endpoint::AuthEndpointSource;
use crate::epoch_ms;
use crate::grant::{grant_from_message, TokenGrant};
use crate::poll::{poll_until, PollPolicy};
use crate::refresh::RefreshClient;
use crate::storage::KeyValueStore;
use crate::validity;

/// States of the acquisition machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    CheckCache,
    SilentRefresh,
    AwaitInteractive,
    Ready,
    Expired,
}

/// Events for the embedding widget.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    /// A valid token is cached and ready to render with.
    TokenReady { expires_at_ms: u64 },
    /// Silent refresh failed; the widget should prompt the user to open a
    /// popup at `auth_url`. The correlation id is already embedded as the
    /// `state` parameter and drives the concurrent poll loop.
    InteractiveRequired { auth_url: String, correlation_id: String },
    /// No authorization endpoint could be resolved. Fatal for this attempt;
    /// never retried automatically.
    ConfigurationError { message: String },
    /// The popup was blocked; requires user action, no auto-retry.
    PopupBlocked,
    /// The poll ceiling elapsed without a token; the prompt stays up.
    InteractiveTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    /// No authorization endpoint configured.
    MissingEndpoint,
    /// Interactive flow ended without a token.
    InteractiveTimeout,
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEndpoint => f.write_str("no authorization endpoint configured"),
            Self::InteractiveTimeout => f.write_str("interactive flow timed out"),
        }
    }
}

impl std::error::Error for FlowError {}

/// Per-widget configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Resource (course) id this widget renders.
    pub resource_id: String,
    /// Cache key scoping. Global matches the deployed player.
    pub scope: TokenScope,
    pub poll: PollPolicy,
    /// Upstream base URL for render-time introspection. `None` disables the
    /// remote check and [`AuthFlow::revalidate`] always passes.
    pub introspection_base_url: Option<String>,
}

impl FlowConfig {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            scope: TokenScope::Global,
            poll: PollPolicy::default(),
            introspection_base_url: None,
        }
    }
}

/// In-flight interactive flow. The oneshot sender doubles as the
/// completion guard: whichever resolution path takes it first wins, and
/// taking it cancels the poll loop.
struct PendingInteractive {
    correlation_id: String,
    grant_tx: std::sync::Mutex<Option<oneshot::Sender<TokenGrant>>>,
    cancel: CancellationToken,
}

impl PendingInteractive {
    fn take_tx(&self) -> Option<oneshot::Sender<TokenGrant>> {
        match self.grant_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        }
    }

    /// Resolve with a grant. Returns false for duplicate or late attempts.
    fn resolve(&self, grant: TokenGrant) -> bool {
        let Some(tx) = self.take_tx() else { return false };
        self.cancel.cancel();
        tx.send(grant).is_ok()
    }

    /// End the flow without a token. Dropping the sender wakes the waiter
    /// with an error.
    fn expire(&self) -> bool {
        let Some(tx) = self.take_tx() else { return false };
        self.cancel.cancel();
        drop(tx);
        true
    }
}

pub struct AuthFlow {
    config: FlowConfig,
    cache: TokenCache,
    refresh: RefreshClient,
    endpoints: Arc<dyn AuthEndpointSource>,
    event_tx: broadcast::Sender<FlowEvent>,
    state: RwLock<FlowState>,
    pending: Mutex<Option<Arc<PendingInteractive>>>,
    /// Serializes acquisitions so at most one interactive flow (and popup)
    /// exists per widget instance.
    acquire_gate: Mutex<()>,
}

impl AuthFlow {
    pub fn new(
        config: FlowConfig,
        store: Arc<dyn KeyValueStore>,
        endpoints: Arc<dyn AuthEndpointSource>,
        event_tx: broadcast::Sender<FlowEvent>,
    ) -> Arc<Self> {
        let cache = TokenCache::new(store, config.scope);
        Arc::new(Self {
            config,
            cache,
            refresh: RefreshClient::new(),
            endpoints,
            event_tx,
            state: RwLock::new(FlowState::Idle),
            pending: Mutex::new(None),
            acquire_gate: Mutex::new(()),
        })
    }

    pub async fn state(&self) -> FlowState {
        *self.state.read().await
    }

    /// Obtain a valid access token, walking the machine as far as needed:
    /// cache, silent refresh, then the interactive path.
    ///
    /// In the interactive phase this emits `InteractiveRequired`, waits for
    /// the first of {popup message, poll success, poll ceiling}, and
    /// resolves exactly once. On timeout the prompt state is kept so the
    /// user can try again.
    pub async fn token(self: &Arc<Self>) -> Result<String, FlowError> {
        let _gate = self.acquire_gate.lock().await;

        self.set_state(FlowState::CheckCache).await;
        let resource_id = self.config.resource_id.clone();
        if let Some(cached) = self.cache.get(&resource_id) {
            if validity::is_valid(&cached, epoch_ms()) {
                self.set_state(FlowState::Ready).await;
                let _ = self
                    .event_tx
                    .send(FlowEvent::TokenReady { expires_at_ms: cached.expires_at_ms });
                return Ok(cached.value);
            }
            // Expired tokens are worse than no token.
            self.cache.clear(&resource_id);
        }

        self.set_state(FlowState::SilentRefresh).await;
        let endpoint = match self.endpoints.resolve().await {
            Some(endpoint) => endpoint,
            None => {
                let message = "no authorization endpoint configured".to_owned();
                tracing::warn!(resource = %resource_id, "{message}");
                let _ = self.event_tx.send(FlowEvent::ConfigurationError { message });
                self.set_state(FlowState::Idle).await;
                return Err(FlowError::MissingEndpoint);
            }
        };

        let correlation_id = self.cache.correlation_id();
        if let Some(grant) = self.refresh.refresh(&endpoint, Some(&correlation_id)).await {
            return Ok(self.accept_grant(grant).await);
        }

        self.interactive(endpoint, correlation_id).await
    }

    /// Interactive phase: prompt, popup bridge, bounded poll.
    async fn interactive(
        self: &Arc<Self>,
        endpoint: String,
        correlation_id: String,
    ) -> Result<String, FlowError> {
        self.set_state(FlowState::AwaitInteractive).await;

        let (grant_tx, grant_rx) = oneshot::channel();
        let pending = Arc::new(PendingInteractive {
            correlation_id: correlation_id.clone(),
            grant_tx: std::sync::Mutex::new(Some(grant_tx)),
            cancel: CancellationToken::new(),
        });
        *self.pending.lock().await = Some(Arc::clone(&pending));

        let _ = self.event_tx.send(FlowEvent::InteractiveRequired {
            auth_url: interactive_url(&endpoint, &correlation_id),
            correlation_id,
        });

        // Poll loop tied to the same correlation id the popup carries, for
        // upstreams that never message back.
        let poll_flow = Arc::clone(self);
        let poll_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let cancel = poll_pending.cancel.clone();
            let result = poll_until(poll_flow.config.poll, &cancel, || {
                let flow = Arc::clone(&poll_flow);
                let endpoint = endpoint.clone();
                let correlation_id = poll_pending.correlation_id.clone();
                async move { flow.refresh.refresh(&endpoint, Some(&correlation_id)).await }
            })
            .await;

            match result {
                Some(grant) => {
                    poll_pending.resolve(grant);
                }
                None => {
                    // Ceiling elapsed (a cancelled loop means another path
                    // already resolved and expire() is a no-op).
                    if poll_pending.expire() {
                        let _ = poll_flow.event_tx.send(FlowEvent::InteractiveTimeout);
                    }
                }
            }
        });

        match grant_rx.await {
            Ok(grant) => {
                *self.pending.lock().await = None;
                Ok(self.accept_grant(grant).await)
            }
            Err(_) => {
                // Timed out. Deregister the bridge; the prompt stays up and
                // a fresh token() call starts a new flow.
                *self.pending.lock().await = None;
                Err(FlowError::InteractiveTimeout)
            }
        }
    }

    /// Bridge for the embedder's popup message listener.
    ///
    /// Returns true when the message carried a token and resolved the
    /// pending flow. Duplicate or late messages, messages without the
    /// token `type` tag, and messages outside an interactive flow are all
    /// ignored — the cache is never written from here.
    pub async fn deliver_message(&self, message: &serde_json::Value) -> bool {
        let Some(grant) = grant_from_message(message) else { return false };
        let pending = self.pending.lock().await.clone();
        match pending {
            Some(pending) => pending.resolve(grant),
            None => false,
        }
    }

    /// Render-time revalidation of the cached token (incoming path).
    ///
    /// Runs the upstream introspection with fail-open semantics; on an
    /// explicit upstream rejection the cache is cleared and the machine
    /// parks in `Expired` until the next [`AuthFlow::token`] call.
    pub async fn revalidate(&self) -> bool {
        let Some(base_url) = &self.config.introspection_base_url else { return true };
        let Some(cached) = self.cache.get(&self.config.resource_id) else { return false };
        if validity::check_upstream(self.refresh.http(), base_url, &cached.value).await {
            return true;
        }
        self.cache.clear(&self.config.resource_id);
        self.set_state(FlowState::Expired).await;
        false
    }

    /// Report a blocked popup. Surfaced to event listeners; the flow itself
    /// never retries the popup.
    pub fn report_popup_blocked(&self) {
        let _ = self.event_tx.send(FlowEvent::PopupBlocked);
    }

    async fn accept_grant(&self, grant: TokenGrant) -> String {
        self.cache.set(&self.config.resource_id, &grant.access_token, grant.expires_in);
        self.set_state(FlowState::Ready).await;
        let _ = self.event_tx.send(FlowEvent::TokenReady {
            expires_at_ms: crate::cache::expires_at(epoch_ms(), grant.expires_in),
        });
        grant.access_token
    }

    async fn set_state(&self, next: FlowState) {
        let mut state = self.state.write().await;
        if *state != next {
            tracing::debug!(from = ?*state, to = ?next, "flow state change");
            *state = next;
        }
    }
}

/// Popup URL: the authorization endpoint with the correlation id as its
/// `state` parameter.
fn interactive_url(endpoint: &str, correlation_id: &str) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{sep}state={correlation_id}")
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
