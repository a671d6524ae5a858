// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;

#[tokio::test(start_paused = true)]
async fn stops_at_ceiling_without_success() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&attempts);
    let policy = PollPolicy { interval: Duration::from_secs(3), ceiling: Duration::from_secs(60) };
    let cancel = CancellationToken::new();

    let result: Option<()> = poll_until(policy, &cancel, move || {
        let counted = Arc::clone(&counted);
        async move {
            counted.fetch_add(1, Ordering::Relaxed);
            None
        }
    })
    .await;

    assert!(result.is_none());
    // 60s ceiling / 3s interval: ticks at 3s..57s, deadline wins at 60s.
    assert_eq!(attempts.load(Ordering::Relaxed), 19);
}

#[tokio::test(start_paused = true)]
async fn stops_immediately_on_success() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&attempts);
    let policy = PollPolicy { interval: Duration::from_secs(1), ceiling: Duration::from_secs(60) };
    let cancel = CancellationToken::new();

    let result = poll_until(policy, &cancel, move || {
        let counted = Arc::clone(&counted);
        async move {
            let n = counted.fetch_add(1, Ordering::Relaxed) + 1;
            (n == 3).then_some("token")
        }
    })
    .await;

    assert_eq!(result, Some("token"));
    // No further attempts after the success.
    assert_eq!(attempts.load(Ordering::Relaxed), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_polling() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&attempts);
    let policy = PollPolicy { interval: Duration::from_secs(1), ceiling: Duration::from_secs(60) };
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        canceller.cancel();
    });

    let result: Option<()> = poll_until(policy, &cancel, move || {
        let counted = Arc::clone(&counted);
        async move {
            counted.fetch_add(1, Ordering::Relaxed);
            None
        }
    })
    .await;

    assert!(result.is_none());
    assert_eq!(attempts.load(Ordering::Relaxed), 2);
}

#[tokio::test(start_paused = true)]
async fn no_attempt_before_first_interval() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&attempts);
    let policy = PollPolicy { interval: Duration::from_secs(5), ceiling: Duration::from_secs(4) };
    let cancel = CancellationToken::new();

    // Ceiling shorter than the interval: the loop must end with zero attempts.
    let result: Option<()> = poll_until(policy, &cancel, move || {
        let counted = Arc::clone(&counted);
        async move {
            counted.fetch_add(1, Ordering::Relaxed);
            None
        }
    })
    .await;

    assert!(result.is_none());
    assert_eq!(attempts.load(Ordering::Relaxed), 0);
}
