// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded polling: fixed interval, hard ceiling, cancellable.
//!
//! Uses `tokio::time` throughout so tests drive it under paused virtual
//! time instead of wall-clock delays.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Interval and hard ceiling for a polling loop.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(3), ceiling: Duration::from_secs(60) }
    }
}

/// Run `attempt` at a fixed interval until it yields a value, the ceiling
/// elapses, or `cancel` fires — whichever comes first. No attempt is
/// started after the ceiling, and none after a success.
pub async fn poll_until<F, Fut, T>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = tokio::time::Instant::now();
    let deadline = start + policy.ceiling;
    let mut interval = tokio::time::interval_at(start + policy.interval, policy.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep_until(deadline) => return None,
            _ = interval.tick() => {}
        }
        if let Some(value) = attempt().await {
            return Some(value);
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
