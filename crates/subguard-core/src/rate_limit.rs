//! Fixed-window attempt counters keyed by action.
//!
//! `window_id = floor(now / window_ms)`. A stored counter from any other
//! window counts as zero. Windows are fixed, not sliding, so attempts that
//! straddle a boundary are counted in separate windows.

use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::error::GuardError;
use crate::store::{read_record, write_record, KeyValueStore, StoreError};

/// Prefix of every rate-limit entry in the store.
pub const RATE_KEY_PREFIX: &str = "subguard.rate.";

const MINUTE_MS: u64 = 60_000;

/// Persisted counter for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
    pub window_id: u64,
    pub count: u32,
    /// Window length the id was computed with; 0 for records that predate it.
    #[serde(default)]
    pub window_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Attempts recorded in the current window, this one included when allowed.
    pub count: u32,
    pub max: u32,
    pub window_id: u64,
    /// Time until the current window closes.
    pub retry_after_ms: u64,
    /// Set when storage misbehaved and the check fell back to allowing.
    pub advisory: Option<GuardError>,
}

impl RateDecision {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.count)
    }
}

pub fn rate_key(action: &str) -> String {
    format!("{RATE_KEY_PREFIX}{action}")
}

fn window_ms(window_minutes: u64) -> u64 {
    window_minutes.max(1).saturating_mul(MINUTE_MS)
}

pub struct RateLimiter {
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Count stored for the current window, or 0 when it belongs to another one.
    fn current_count(stored: Option<RateWindow>, window_id: u64, window_ms: u64) -> u32 {
        match stored {
            Some(w) if w.window_id == window_id && (w.window_ms == 0 || w.window_ms == window_ms) => {
                w.count
            }
            _ => 0,
        }
    }

    /// Record an attempt for `action` if the window has room.
    ///
    /// Read errors fail open: the attempt is allowed and the decision carries
    /// a `StorageUnavailable` advisory.
    pub fn check<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        action: &str,
        max: u32,
        window_minutes: u64,
    ) -> RateDecision {
        let now = self.clock.now_ms();
        let window_ms = window_ms(window_minutes);
        let window_id = now / window_ms;
        let retry_after_ms = (window_id + 1) * window_ms - now;
        let key = rate_key(action);

        let stored = match read_record::<RateWindow, S>(&*store, &key) {
            Ok(w) => w,
            Err(StoreError::Corrupt { source, .. }) => {
                tracing::warn!(action, error = %source, "corrupt rate-limit entry; starting fresh");
                None
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "rate-limit store unreadable; allowing attempt");
                return RateDecision {
                    allowed: true,
                    count: 0,
                    max,
                    window_id,
                    retry_after_ms,
                    advisory: Some(GuardError::StorageUnavailable(e.to_string())),
                };
            }
        };

        let count = Self::current_count(stored, window_id, window_ms);
        if count >= max {
            tracing::info!(action, count, max, retry_after_ms, "rate limit exceeded");
            return RateDecision {
                allowed: false,
                count,
                max,
                window_id,
                retry_after_ms,
                advisory: None,
            };
        }

        let next = RateWindow {
            window_id,
            count: count + 1,
            window_ms,
        };
        let advisory = match write_record(store, &key, &next) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(action, error = %e, "could not persist rate-limit entry");
                Some(GuardError::StorageUnavailable(e.to_string()))
            }
        };
        tracing::debug!(action, count = next.count, max, window_id, "attempt recorded");

        RateDecision {
            allowed: true,
            count: next.count,
            max,
            window_id,
            retry_after_ms,
            advisory,
        }
    }

    /// Current state for `action` without recording an attempt.
    pub fn peek<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        action: &str,
        max: u32,
        window_minutes: u64,
    ) -> Result<RateDecision, StoreError> {
        let now = self.clock.now_ms();
        let window_ms = window_ms(window_minutes);
        let window_id = now / window_ms;
        let stored = read_record::<RateWindow, S>(store, &rate_key(action))?;
        let count = Self::current_count(stored, window_id, window_ms);
        Ok(RateDecision {
            allowed: count < max,
            count,
            max,
            window_id,
            retry_after_ms: (window_id + 1) * window_ms - now,
            advisory: None,
        })
    }

    /// Forget the counter for `action`.
    pub fn reset<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        action: &str,
    ) -> Result<(), StoreError> {
        store.remove(&rate_key(action))
    }

    /// Best-effort housekeeping: drop entries whose window has closed, plus
    /// unreadable ones. Returns how many were removed.
    pub fn cleanup_stale<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<usize, StoreError> {
        let now = self.clock.now_ms();
        let mut removed = 0;
        for key in store.keys()? {
            if !key.starts_with(RATE_KEY_PREFIX) {
                continue;
            }
            let stale = match read_record::<RateWindow, S>(&*store, &key) {
                Ok(Some(w)) => {
                    w.window_ms == 0 || (w.window_id + 1).saturating_mul(w.window_ms) <= now
                }
                Ok(None) => false,
                Err(StoreError::Corrupt { .. }) => true,
                Err(e) => return Err(e),
            };
            if stale {
                store.remove(&key)?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "stale rate-limit entries removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    const HOUR: u64 = 3_600_000;

    fn limiter(clock: &ManualClock) -> RateLimiter {
        RateLimiter::new(Arc::new(clock.clone()))
    }

    #[test]
    fn three_allowed_then_rejected_then_fresh_window() {
        // Start mid-window so the boundary is clearly ahead.
        let clock = ManualClock::new(10 * HOUR + 60_000);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();

        let results: Vec<bool> = (0..4)
            .map(|_| rl.check(&mut store, "submission", 3, 60).allowed)
            .collect();
        assert_eq!(results, vec![true, true, true, false]);

        clock.set(11 * HOUR);
        let after = rl.check(&mut store, "submission", 3, 60);
        assert!(after.allowed);
        assert_eq!(after.count, 1);
        assert_eq!(after.remaining(), 2);
    }

    #[test]
    fn rejection_reports_time_to_boundary() {
        let clock = ManualClock::new(5 * HOUR + 15 * 60_000);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        rl.check(&mut store, "submission", 1, 60);
        let denied = rl.check(&mut store, "submission", 1, 60);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_ms, 45 * 60_000);
        assert_eq!(denied.count, 1);
    }

    #[test]
    fn rejected_attempts_do_not_increment() {
        let clock = ManualClock::new(0);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        for _ in 0..5 {
            rl.check(&mut store, "submission", 2, 60);
        }
        let stored: RateWindow = read_record(&store, &rate_key("submission"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.count, 2);
    }

    #[test]
    fn boundary_burst_is_preserved() {
        // Two windows back to back admit 2 * max within a few ms.
        let clock = ManualClock::new(HOUR - 1);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        assert!(rl.check(&mut store, "submission", 1, 60).allowed);
        clock.advance(2);
        assert!(rl.check(&mut store, "submission", 1, 60).allowed);
    }

    #[test]
    fn actions_are_independent() {
        let clock = ManualClock::new(0);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        assert!(rl.check(&mut store, "submission", 1, 60).allowed);
        assert!(!rl.check(&mut store, "submission", 1, 60).allowed);
        assert!(rl.check(&mut store, "reaction", 1, 60).allowed);
    }

    #[test]
    fn zero_max_never_admits_and_zero_window_is_one_minute() {
        let clock = ManualClock::new(30_000);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        assert!(!rl.check(&mut store, "locked", 0, 60).allowed);

        let d = rl.check(&mut store, "fast", 5, 0);
        assert!(d.allowed);
        assert_eq!(d.retry_after_ms, 30_000);
    }

    #[test]
    fn changed_window_length_starts_fresh() {
        let clock = ManualClock::new(0);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        assert!(rl.check(&mut store, "submission", 1, 60).allowed);
        assert!(rl.check(&mut store, "submission", 1, 30).allowed);
    }

    #[test]
    fn corrupt_entry_is_treated_as_empty() {
        let clock = ManualClock::new(0);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        store.set(&rate_key("submission"), "[garbage").unwrap();
        let d = rl.check(&mut store, "submission", 3, 60);
        assert!(d.allowed);
        assert_eq!(d.count, 1);
        assert!(d.advisory.is_none());
    }

    #[test]
    fn peek_does_not_record() {
        let clock = ManualClock::new(0);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        rl.check(&mut store, "submission", 3, 60);
        let p = rl.peek(&store, "submission", 3, 60).unwrap();
        assert_eq!(p.count, 1);
        assert!(p.allowed);
        assert_eq!(rl.peek(&store, "submission", 3, 60).unwrap().count, 1);
    }

    #[test]
    fn reset_and_cleanup() {
        let clock = ManualClock::new(0);
        let rl = limiter(&clock);
        let mut store = MemoryStore::new();
        rl.check(&mut store, "submission", 3, 60);
        rl.check(&mut store, "reaction", 3, 1);
        store.set("subguard.token", "{}").unwrap();
        store.set(&rate_key("broken"), "nope").unwrap();

        rl.reset(&mut store, "submission").unwrap();
        assert_eq!(rl.peek(&store, "submission", 3, 60).unwrap().count, 0);

        // The one-minute window for "reaction" has closed, the corrupt entry
        // goes too, and the unrelated key is untouched.
        clock.set(2 * 60_000);
        assert_eq!(rl.cleanup_stale(&mut store).unwrap(), 2);
        assert_eq!(store.keys().unwrap(), vec!["subguard.token".to_string()]);
    }
}
