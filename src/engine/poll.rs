//! Bounded polling.
//!
//! Settle waits (IDS log flush, tunnel bring-up, VRRP re-election) are
//! expressed as "re-check until the condition holds or the deadline passes"
//! instead of fixed sleeps.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};

/// Deadline and retry interval for a polled condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollPolicy {
    /// Total time allowed for the condition to appear
    pub timeout_ms: u64,
    /// Pause between attempts
    pub interval_ms: u64,
}

impl PollPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        PollPolicy {
            timeout_ms: timeout.as_millis() as u64,
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// A single attempt, no waiting
    pub fn once() -> Self {
        PollPolicy {
            timeout_ms: 0,
            interval_ms: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            timeout_ms: 10_000,
            interval_ms: 500,
        }
    }
}

/// Result of a polling loop
#[derive(Debug, Clone)]
pub struct Polled<T> {
    /// Value produced by the last attempt
    pub value: T,
    /// Whether the condition held on the last attempt
    pub satisfied: bool,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Run `probe` until `done` accepts its value or the policy deadline passes.
///
/// At least one attempt is always made. No attempt starts after the
/// deadline, so the total wait is bounded by the timeout plus the duration
/// of one probe.
pub fn poll_until<T, P, D>(policy: &PollPolicy, mut probe: P, mut done: D) -> Polled<T>
where
    P: FnMut() -> T,
    D: FnMut(&T) -> bool,
{
    let start = Instant::now();
    let deadline = start + policy.timeout();
    let mut attempts = 0;

    loop {
        let value = probe();
        attempts += 1;

        if done(&value) {
            return Polled {
                value,
                satisfied: true,
                attempts,
                elapsed: start.elapsed(),
            };
        }

        let next_attempt = Instant::now() + policy.interval();
        if next_attempt > deadline {
            return Polled {
                value,
                satisfied: false,
                attempts,
                elapsed: start.elapsed(),
            };
        }
        thread::sleep(policy.interval());
    }
}
