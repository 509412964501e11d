// crates/gcoin-core/src/env.rs
//
// Execution environment supplied with every ledger call: the immediate
// caller, the originating account, and the platform time in seconds.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Account;

/// Per-call environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Env {
    /// Immediate caller of the operation.
    pub caller: Account,
    /// Account that originated the enclosing call chain.
    pub origin: Account,
    /// Platform time, unix seconds. Monotonic but coarse.
    pub now: u64,
}

impl Env {
    /// Environment for a direct call (origin == caller).
    pub fn new(caller: Account, now: u64) -> Self {
        Self {
            caller,
            origin: caller,
            now,
        }
    }

    /// Same environment with a different origin (forwarded calls).
    pub fn with_origin(mut self, origin: Account) -> Self {
        self.origin = origin;
        self
    }

    /// Environment stamped with the clock's current time.
    pub fn at(clock: &dyn Clock, caller: Account) -> Self {
        Self::new(caller, clock.now())
    }
}

/// Source of platform time.
pub trait Clock: Send + Sync {
    /// Current time in unix seconds.
    fn now(&self) -> u64;
}

/// Wall-clock time from the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Manually driven clock for tests and script replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Render a unix timestamp as an RFC 3339 UTC string.
pub fn format_timestamp(ts: u64) -> String {
    match i64::try_from(ts).ok().and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)) {
        Some(dt) => dt.to_rfc3339(),
        None => format!("{}s", ts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(86_400);
        assert_eq!(clock.now(), 87_400);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_env_origin_defaults_to_caller() {
        let alice = Account::from_label("alice");
        let env = Env::new(alice, 42);
        assert_eq!(env.origin, alice);

        let relay = Account::from_label("relay");
        let forwarded = Env::new(relay, 42).with_origin(alice);
        assert_eq!(forwarded.caller, relay);
        assert_eq!(forwarded.origin, alice);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_timestamp(86_400), "1970-01-02T00:00:00+00:00");
    }
}
