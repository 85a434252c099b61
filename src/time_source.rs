//! Time source abstraction for real and simulated time.
//!
//! The service never calls the system clock directly. It reads time through a
//! [`TimeSource`], which lets the clock task, the insane-clock detection and the
//! daemon loop run against simulated time in tests.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

pub trait TimeSource: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);
}

/// System clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }
}

/// Fast-forward simulated clock.
///
/// Time only moves when told to: `sleep` jumps forward by exactly the requested
/// duration, and `set`/`advance` move it explicitly.
pub struct SimulatedTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl SimulatedTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, duration: StdDuration) {
        if let Ok(mut guard) = self.current.lock() {
            *guard += ChronoDuration::milliseconds(duration.as_millis() as i64);
        }
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.current
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    fn sleep(&self, duration: StdDuration) {
        self.advance(duration);
        // Let other threads run and logs flush
        std::thread::sleep(StdDuration::from_millis(1));
    }
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" as UTC.
pub fn parse_datetime_utc(s: &str) -> Result<DateTime<Utc>, String> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_simulated_sleep_advances_time() {
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        let source = SimulatedTimeSource::new(start);
        source.sleep(StdDuration::from_secs(90));
        assert_eq!(source.now(), start + ChronoDuration::seconds(90));
    }

    #[test]
    fn test_simulated_set() {
        let source = SimulatedTimeSource::new(Utc::now());
        let target = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        source.set(target);
        assert_eq!(source.now(), target);
    }

    #[test]
    fn test_parse_datetime_utc() {
        let parsed = parse_datetime_utc("2024-06-21 04:43:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 21, 4, 43, 0).unwrap());
        assert!(parse_datetime_utc("21/06/2024").is_err());
    }
}
