use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Assigns strictly increasing millisecond timestamps even when two calls
/// land in the same wall-clock millisecond, so `created_at` can double as
/// an exact time-priority key.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    pub fn next(&self) -> i64 {
        let now = now_millis();
        loop {
            let prev = self.last.load(Ordering::SeqCst);
            let candidate = if now > prev { now } else { prev + 1 };
            if self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return candidate;
            }
        }
    }
}
