//! Time source and id generation.
//!
//! Record ids are clock-derived millisecond values, kept strictly increasing
//! so two records created within the same tick never share an id.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Used in tests and previews.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Monotonic id source seeded from a clock.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: `now` unless that would not be greater than every id handed
    /// out so far or `floor` (the largest id already stored).
    pub fn next_id(&self, now_millis: i64, floor: Option<i64>) -> i64 {
        let floor = floor.unwrap_or(i64::MIN);
        let step = |last: i64| now_millis.max(last.saturating_add(1)).max(floor.saturating_add(1));
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(step(last)))
            .unwrap_or_else(|last| last);
        step(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_millis(), 1_500);
        clock.set(10);
        assert_eq!(clock.now_millis(), 10);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_ids_follow_clock() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(1_000, None), 1_000);
        assert_eq!(ids.next_id(2_000, None), 2_000);
    }

    #[test]
    fn test_ids_unique_within_same_tick() {
        let ids = IdGenerator::new();
        let a = ids.next_id(1_000, None);
        let b = ids.next_id(1_000, None);
        let c = ids.next_id(999, None);
        assert_eq!((a, b, c), (1_000, 1_001, 1_002));
    }

    #[test]
    fn test_ids_skip_past_stored_floor() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(1_000, Some(5_000)), 5_001);
        assert_eq!(ids.next_id(1_000, None), 5_002);
    }

    #[test]
    fn test_ids_returned_match_recorded_last() {
        let ids = IdGenerator::new();
        let first = ids.next_id(7_000, None);
        assert_eq!(ids.last.load(Ordering::SeqCst), first);
        let second = ids.next_id(7_000, Some(7_500));
        assert_eq!((first, second), (7_000, 7_501));
        assert_eq!(ids.last.load(Ordering::SeqCst), second);
    }
}
