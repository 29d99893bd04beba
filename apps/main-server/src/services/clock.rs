//! Creation timestamps.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Wall clock that never goes backwards.
///
/// Each call returns the current UTC time, or the previously issued value if
/// the system clock stepped back since.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    /// Creates a new clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next timestamp.
    pub fn now(&self) -> DateTime<Utc> {
        self.issue(Utc::now())
    }

    fn issue(&self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let issued = match *last {
            Some(prev) if prev > candidate => prev,
            _ => candidate,
        };
        *last = Some(issued);
        issued
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..100 {
            let next = clock.now();
            assert!(next >= prev);
            prev = next;
        }
    }

    #[test]
    fn test_clock_holds_when_system_time_steps_back() {
        let clock = MonotonicClock::new();
        let t0 = Utc::now();

        assert_eq!(clock.issue(t0), t0);
        assert_eq!(clock.issue(t0 - Duration::seconds(5)), t0);
        assert_eq!(clock.issue(t0 + Duration::seconds(1)), t0 + Duration::seconds(1));
    }
}
