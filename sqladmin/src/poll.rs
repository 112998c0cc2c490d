//! Bounded polling.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// How often to look and how long to keep looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    pub fn from_secs(interval: u64, max_wait: u64) -> Self {
        Self::new(Duration::from_secs(interval), Duration::from_secs(max_wait))
    }

    /// Observe once, never wait.
    pub fn once() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

/// Calls `observe` until `done` accepts an observation or the policy's
/// deadline passes, and returns the last observation.
///
/// `observe` always runs at least once. `None` observations are skipped but
/// do not reset the last good one.
pub async fn poll_until<T, F, Fut, D>(policy: PollPolicy, mut observe: F, done: D) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
    D: Fn(&T) -> bool,
{
    let deadline = Instant::now() + policy.max_wait;
    let mut last = None;
    loop {
        if let Some(observed) = observe().await {
            let finished = done(&observed);
            last = Some(observed);
            if finished {
                return last;
            }
        }
        let now = Instant::now();
        if now >= deadline {
            return last;
        }
        sleep(policy.interval.min(deadline - now)).await;
    }
}
