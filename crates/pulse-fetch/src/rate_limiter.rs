//! Per-provider call budget.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Length of the rolling window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Snapshot of a limiter's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterState {
    /// Oldest call still inside the window, if any.
    pub window_start: Option<Instant>,
    /// Calls made within the window.
    pub calls_in_window: usize,
    /// Budget per window.
    pub max_calls: usize,
    /// Tasks queued behind the one in flight.
    pub pending: usize,
}

/// Queues calls so that at most `max_calls` start within any rolling window.
///
/// Calls never fail for lack of budget; they wait. Callers are served in
/// arrival order with one call in flight at a time, and a failed call does
/// not hold up the ones behind it.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    turn: tokio::sync::Mutex<()>,
    calls: Mutex<VecDeque<Instant>>,
    pending: AtomicUsize,
}

impl RateLimiter {
    /// Limiter allowing `max_calls` per 60 seconds. A budget of zero is
    /// treated as one.
    #[must_use]
    pub fn new(max_calls: usize) -> Self {
        Self::with_window(max_calls, WINDOW)
    }

    /// Limiter with a custom window length.
    #[must_use]
    pub fn with_window(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            turn: tokio::sync::Mutex::new(()),
            calls: Mutex::new(VecDeque::new()),
            pending: AtomicUsize::new(0),
        }
    }

    /// Run `f` once budget is available and return its output unchanged.
    pub async fn execute<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let queued = Queued::enter(&self.pending);
        // tokio's mutex is fair, so waiters are served FIFO
        let _turn = self.turn.lock().await;
        drop(queued);

        self.acquire().await;
        f().await
    }

    /// Current bookkeeping.
    #[must_use]
    pub fn state(&self) -> RateLimiterState {
        let now = Instant::now();
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        self.expire(&mut calls, now);
        RateLimiterState {
            window_start: calls.front().copied(),
            calls_in_window: calls.len(),
            max_calls: self.max_calls,
            pending: self.pending.load(Ordering::SeqCst),
        }
    }

    async fn acquire(&self) {
        loop {
            let wait_until = {
                let now = Instant::now();
                let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
                self.expire(&mut calls, now);
                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    None
                } else {
                    calls.front().map(|&oldest| oldest + self.window)
                }
            };

            match wait_until {
                None => return,
                Some(deadline) => {
                    debug!(
                        wait_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
                        "rate limit reached, waiting"
                    );
                    tokio::time::sleep_until(deadline).await;
                }
            }
        }
    }

    fn expire(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while calls
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.window)
        {
            calls.pop_front();
        }
    }
}

/// Counts a caller as pending until it is dropped, so cancelled waiters
/// leave the count.
struct Queued<'a>(&'a AtomicUsize);

impl<'a> Queued<'a> {
    fn enter(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(pending)
    }
}

impl Drop for Queued<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
