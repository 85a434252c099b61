//! The clock device: minute ticks, sunrise/sunset events and the insane-clock
//! recovery schedule.
//!
//! [`ClockTask`] only decides what a tick means. The parameters service applies
//! the outcome (sending events, refreshing sun times, saving the timestamp).

use chrono::{DateTime, Datelike, Duration as ChronoDuration, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

use crate::constants::{CLOCK_TICK_INTERVAL_SECS, NTP_SYNC_INTERVAL_SECS, SUN_REFRESH_TIME};
use crate::events::{ParametersEvent, TimeNow};
use crate::geo::SunTimes;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// A point in time split into the fields the clock device exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockTime {
    pub timestamp: i64,
    pub iso: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    /// 0 is monday, 6 is sunday
    pub weekday: u32,
    pub weekday_literal: String,
}

/// Split a unix timestamp into clock fields, in `tz`.
///
/// A timestamp chrono cannot represent is treated as the epoch.
pub fn format_time(timestamp: i64, tz: Tz) -> ClockTime {
    let utc = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
    let local = utc.with_timezone(&tz);
    let weekday = local.weekday().num_days_from_monday();
    ClockTime {
        timestamp: utc.timestamp(),
        iso: local.to_rfc3339_opts(SecondsFormat::Secs, false),
        year: local.year(),
        month: local.month(),
        day: local.day(),
        hour: local.hour(),
        minute: local.minute(),
        weekday,
        weekday_literal: WEEKDAYS[weekday as usize].to_string(),
    }
}

/// Delay until the next minute boundary; zero when already on one.
pub fn delay_to_next_minute(now: DateTime<Utc>) -> StdDuration {
    let into_minute = now.timestamp().rem_euclid(CLOCK_TICK_INTERVAL_SECS as i64);
    if into_minute == 0 && now.timestamp_subsec_nanos() == 0 {
        return StdDuration::ZERO;
    }
    let whole = CLOCK_TICK_INTERVAL_SECS as i64 - into_minute;
    StdDuration::from_secs(whole as u64).saturating_sub(StdDuration::from_nanos(
        now.timestamp_subsec_nanos() as u64,
    ))
}

/// True when the clock is behind the last saved tick, which happens after a
/// reboot without a working NTP sync.
pub fn is_clock_insane(saved_timestamp: i64, now: DateTime<Utc>) -> bool {
    now.timestamp() - saved_timestamp < 0
}

/// What a tick asks the service to do.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub events: Vec<ParametersEvent>,
    /// Recompute sunrise/sunset for the new day
    pub refresh_sun: bool,
    /// Timestamp to persist, `None` while a time sync is pending
    pub persist_timestamp: Option<i64>,
}

/// Minute task state.
#[derive(Debug, Default)]
pub struct ClockTask {
    next_sync: Option<DateTime<Utc>>,
}

impl ClockTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin retrying the NTP sync every interval, the first attempt one interval
    /// from `now`.
    pub fn start_sync(&mut self, now: DateTime<Utc>) {
        self.next_sync = Some(now + ChronoDuration::seconds(NTP_SYNC_INTERVAL_SECS as i64));
    }

    pub fn is_syncing(&self) -> bool {
        self.next_sync.is_some()
    }

    pub fn sync_due(&self, now: DateTime<Utc>) -> bool {
        self.next_sync.is_some_and(|due| now >= due)
    }

    pub fn next_sync(&self) -> Option<DateTime<Utc>> {
        self.next_sync
    }

    /// Record a sync attempt: success stops the retries, failure reschedules.
    pub fn sync_attempted(&mut self, success: bool, now: DateTime<Utc>) {
        if success {
            self.next_sync = None;
        } else if self.next_sync.is_some() {
            self.start_sync(now);
        }
    }

    /// Evaluate one tick at `time` against today's sun times.
    pub fn tick(&self, time: &ClockTime, sun: &SunTimes) -> TickOutcome {
        let summary = sun.summary();
        let mut events = vec![ParametersEvent::TimeNow(TimeNow {
            time: time.clone(),
            sunrise: summary.sunrise,
            sunset: summary.sunset,
        })];

        let current = (time.hour, time.minute);
        if sun.sunrise_hm() == Some(current) {
            events.push(ParametersEvent::TimeSunrise);
        }
        if sun.sunset_hm() == Some(current) {
            events.push(ParametersEvent::TimeSunset);
        }

        TickOutcome {
            events,
            refresh_sun: current == SUN_REFRESH_TIME,
            persist_timestamp: (!self.is_syncing()).then_some(time.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::{London, Paris};

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn sun_at(rise: (u32, u32), set: (u32, u32)) -> SunTimes {
        SunTimes {
            sunrise: Some(London.with_ymd_and_hms(2024, 6, 21, rise.0, rise.1, 12).unwrap()),
            sunset: Some(London.with_ymd_and_hms(2024, 6, 21, set.0, set.1, 40).unwrap()),
        }
    }

    #[test]
    fn test_format_time_fields() {
        // Friday 21 June 2024, 10:30 UTC is 12:30 in Paris
        let time = format_time(ts(2024, 6, 21, 10, 30, 0).timestamp(), Paris);
        assert_eq!(time.year, 2024);
        assert_eq!(time.month, 6);
        assert_eq!(time.day, 21);
        assert_eq!(time.hour, 12);
        assert_eq!(time.minute, 30);
        assert_eq!(time.weekday, 4);
        assert_eq!(time.weekday_literal, "friday");
        assert_eq!(time.iso, "2024-06-21T12:30:00+02:00");
    }

    #[test]
    fn test_format_time_weekday_bounds() {
        let monday = format_time(ts(2024, 6, 17, 12, 0, 0).timestamp(), London);
        assert_eq!((monday.weekday, monday.weekday_literal.as_str()), (0, "monday"));
        let sunday = format_time(ts(2024, 6, 23, 12, 0, 0).timestamp(), London);
        assert_eq!((sunday.weekday, sunday.weekday_literal.as_str()), (6, "sunday"));
    }

    #[test]
    fn test_delay_to_next_minute() {
        assert_eq!(delay_to_next_minute(ts(2024, 1, 1, 0, 0, 0)), StdDuration::ZERO);
        assert_eq!(
            delay_to_next_minute(ts(2024, 1, 1, 0, 0, 45)),
            StdDuration::from_secs(15)
        );
        let with_millis = ts(2024, 1, 1, 0, 0, 59) + ChronoDuration::milliseconds(500);
        assert_eq!(
            delay_to_next_minute(with_millis),
            StdDuration::from_millis(500)
        );
    }

    #[test]
    fn test_insane_clock() {
        let now = ts(2024, 6, 21, 12, 0, 0);
        assert!(is_clock_insane(now.timestamp() + 1, now));
        assert!(!is_clock_insane(now.timestamp(), now));
        assert!(!is_clock_insane(0, now));
    }

    #[test]
    fn test_tick_sends_now_event() {
        let task = ClockTask::new();
        let sun = sun_at((4, 43), (21, 21));
        let time = format_time(ts(2024, 6, 21, 11, 0, 0).timestamp(), London);

        let outcome = task.tick(&time, &sun);
        assert_eq!(outcome.events.len(), 1);
        match &outcome.events[0] {
            ParametersEvent::TimeNow(now) => {
                assert_eq!(now.time, time);
                assert_eq!(now.sunrise, sun.summary().sunrise);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!outcome.refresh_sun);
        assert_eq!(outcome.persist_timestamp, Some(time.timestamp));
    }

    #[test]
    fn test_tick_on_sunrise_and_sunset_minutes() {
        let task = ClockTask::new();
        let sun = sun_at((4, 43), (21, 21));

        // 03:43 UTC is 04:43 BST
        let rise = format_time(ts(2024, 6, 21, 3, 43, 0).timestamp(), London);
        let outcome = task.tick(&rise, &sun);
        assert_eq!(outcome.events.last(), Some(&ParametersEvent::TimeSunrise));

        let set = format_time(ts(2024, 6, 21, 20, 21, 0).timestamp(), London);
        let outcome = task.tick(&set, &sun);
        assert_eq!(outcome.events.last(), Some(&ParametersEvent::TimeSunset));
    }

    #[test]
    fn test_tick_without_sun_times() {
        let task = ClockTask::new();
        let time = format_time(ts(2024, 6, 21, 3, 43, 0).timestamp(), London);
        let outcome = task.tick(&time, &SunTimes::default());
        assert_eq!(outcome.events.len(), 1);
    }

    #[test]
    fn test_tick_refreshes_sun_after_midnight() {
        let task = ClockTask::new();
        // 23:05 UTC on the 20th is 00:05 BST on the 21st
        let time = format_time(ts(2024, 6, 20, 23, 5, 0).timestamp(), London);
        assert!(task.tick(&time, &SunTimes::default()).refresh_sun);
    }

    #[test]
    fn test_sync_schedule() {
        let now = ts(2024, 6, 21, 12, 0, 0);
        let mut task = ClockTask::new();
        assert!(!task.is_syncing());
        assert!(!task.sync_due(now));

        task.start_sync(now);
        assert!(task.is_syncing());
        assert!(!task.sync_due(now));
        let due = now + ChronoDuration::seconds(60);
        assert!(task.sync_due(due));

        let time = format_time(now.timestamp(), London);
        assert_eq!(task.tick(&time, &SunTimes::default()).persist_timestamp, None);

        task.sync_attempted(false, due);
        assert_eq!(task.next_sync(), Some(due + ChronoDuration::seconds(60)));

        task.sync_attempted(true, due);
        assert!(!task.is_syncing());
    }
}
