// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization endpoint resolution.
//!
//! Where the endpoint comes from (CMS placeholders, build-time config,
//! a lookup service) is the embedder's business; the orchestrator only
//! sees this trait. Resolution is async because real sources fetch.

use std::future::Future;
use std::pin::Pin;

pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// Source of the authorization endpoint URL, injected by the embedder.
///
/// `None` means no endpoint is configured — a configuration error, not a
/// transient failure; the orchestrator will not retry it.
pub trait AuthEndpointSource: Send + Sync {
    fn resolve(&self) -> ResolveFuture<'_>;
}

/// Fixed endpoint, for embedders with build-time config and for tests.
pub struct StaticEndpoint(pub String);

impl AuthEndpointSource for StaticEndpoint {
    fn resolve(&self) -> ResolveFuture<'_> {
        Box::pin(async move { Some(self.0.clone()) })
    }
}

/// Absent endpoint: always resolves to `None`.
pub struct NoEndpoint;

impl AuthEndpointSource for NoEndpoint {
    fn resolve(&self) -> ResolveFuture<'_> {
        Box::pin(async move { None })
    }
}
