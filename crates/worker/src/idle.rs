// SPDX-License-Identifier: MIT

//! Shuts the worker process down after it has had no connected clients for
//! a configurable grace period. Built on the shared `Clock` abstraction so
//! the arm/cancel/fire sequence is deterministically testable.

use std::time::Duration;

use parking_lot::Mutex;
use signrt_core::Clock;

/// How often `wait_for_shutdown` re-checks the clock. Real wall-clock sleep,
/// independent of the injected `Clock`, so tests using a `FakeClock` can pick
/// an arbitrarily small `idle_timeout` and still resolve promptly.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

struct State {
    armed_at: Option<std::time::Instant>,
}

/// Arms a countdown to `idle_timeout` whenever the last client disconnects;
/// `cancel` (called on the next connect) aborts it. `wait_for_shutdown`
/// resolves once a countdown has run to completion without being cancelled.
///
/// Generic over `Clock` (rather than trait-object dispatch) because `Clock`
/// requires `Clone`, which rules out `dyn Clock`.
pub struct IdleShutdownTimer<C: Clock> {
    clock: C,
    idle_timeout: Duration,
    state: Mutex<State>,
}

impl<C: Clock> IdleShutdownTimer<C> {
    pub fn new(clock: C, idle_timeout: Duration) -> Self {
        Self { clock, idle_timeout, state: Mutex::new(State { armed_at: None }) }
    }

    pub fn arm(&self) {
        self.state.lock().armed_at = Some(self.clock.now());
    }

    pub fn cancel(&self) {
        self.state.lock().armed_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().armed_at.is_some()
    }

    /// Blocks until the timer has been armed continuously for `idle_timeout`.
    pub async fn wait_for_shutdown(&self) {
        loop {
            let armed_at = self.state.lock().armed_at;
            match armed_at {
                Some(armed_at) if self.clock.now().saturating_duration_since(armed_at) >= self.idle_timeout => {
                    return;
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "idle_tests.rs"]
mod tests;
