//! Sunrise and sunset calculations.
//!
//! Events are computed in UTC with the `sunrise` crate, then expressed in the
//! position's timezone. Only events falling on the requested local date are kept.
//! At high latitudes an event may not happen at all on a given date (polar day or
//! night); it is then reported as missing.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use super::DevicePosition;

/// Sunrise and sunset of one day, in the position's timezone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SunTimes {
    pub sunrise: Option<DateTime<Tz>>,
    pub sunset: Option<DateTime<Tz>>,
}

/// Host-facing view of [`SunTimes`]: unix timestamps and ISO 8601 strings, with
/// `0` and `""` for a missing event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SunSummary {
    pub sunrise: i64,
    pub sunrise_iso: String,
    pub sunset: i64,
    pub sunset_iso: String,
}

impl SunTimes {
    pub fn summary(&self) -> SunSummary {
        let split = |event: &Option<DateTime<Tz>>| match event {
            Some(dt) => (dt.timestamp(), dt.to_rfc3339_opts(SecondsFormat::Secs, false)),
            None => (0, String::new()),
        };
        let (sunrise, sunrise_iso) = split(&self.sunrise);
        let (sunset, sunset_iso) = split(&self.sunset);
        SunSummary {
            sunrise,
            sunrise_iso,
            sunset,
            sunset_iso,
        }
    }

    /// Sunrise hour and minute, as compared against clock ticks.
    pub fn sunrise_hm(&self) -> Option<(u32, u32)> {
        self.sunrise.map(|dt| (dt.hour(), dt.minute()))
    }

    pub fn sunset_hm(&self) -> Option<(u32, u32)> {
        self.sunset.map(|dt| (dt.hour(), dt.minute()))
    }
}

fn truncate_to_second(dt: DateTime<Tz>) -> DateTime<Tz> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Occurrence of `event` on the local `date` in `tz`, if any.
///
/// The solar day of `date` is tried first, then its neighbours: with a timezone
/// far from solar time, the event seen on the local date can belong to the
/// previous or next solar day. When the sun does not cross the horizon the crate
/// yields the epoch, which never matches `date`.
fn event_on(coord: Coordinates, date: NaiveDate, tz: Tz, event: SolarEvent) -> Option<DateTime<Tz>> {
    [0, -1, 1]
        .into_iter()
        .filter_map(|offset| date.checked_add_signed(Duration::days(offset)))
        .map(|day| SolarDay::new(coord, day).event_time(event).with_timezone(&tz))
        .find(|local| local.date_naive() == date)
        .map(truncate_to_second)
}

/// Compute sunrise and sunset of `date` at `position`, expressed in `tz`.
///
/// Returns empty times for the unspecified position. An event that does not happen
/// on that local date (polar day or night) is `None`.
pub fn compute_sun_times(position: &DevicePosition, date: NaiveDate, tz: Tz) -> Result<SunTimes> {
    if position.is_unspecified() {
        return Ok(SunTimes::default());
    }

    let coord = Coordinates::new(position.latitude, position.longitude)
        .ok_or_else(|| anyhow::anyhow!("Invalid coordinates: {position}"))?;

    Ok(SunTimes {
        sunrise: event_on(coord, date, tz, SolarEvent::Sunrise),
        sunset: event_on(coord, date, tz, SolarEvent::Sunset),
    })
}
