//! Sun command: show sunrise and sunset for the saved position.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::{FileStore, SettingsStore};
use crate::geo::{SunTimes, compute_sun_times};
use crate::time_source::parse_datetime_utc;

/// Handle the sun command. `at` is a "YYYY-MM-DD HH:MM:SS" UTC time selecting
/// the day; defaults to now.
pub fn handle_sun_command(at: Option<&str>) -> Result<()> {
    log_version!();

    let when: DateTime<Utc> = match at {
        Some(value) => parse_datetime_utc(value).map_err(|e| anyhow::anyhow!(e))?,
        None => Utc::now(),
    };

    let settings = FileStore::open_default()?.load()?;
    let tz = settings.tz().unwrap_or(chrono_tz::UTC);
    let date = when.with_timezone(&tz).date_naive();
    let times = compute_sun_times(&settings.position, date, tz)?;

    log_block_start!("Sun times on {date} at {}", settings.position);
    log_indented!("Timezone: {}", tz.name());
    for line in describe(&times) {
        log_indented!("{line}");
    }
    log_end!();
    Ok(())
}

fn describe(times: &SunTimes) -> Vec<String> {
    let line = |label: &str, event: Option<String>| match event {
        Some(value) => format!("{label}: {value}"),
        None => format!("{label}: none (polar day or night)"),
    };
    vec![
        line(
            "Sunrise",
            times.sunrise.map(|t| t.format("%H:%M:%S").to_string()),
        ),
        line(
            "Sunset",
            times.sunset.map(|t| t.format("%H:%M:%S").to_string()),
        ),
    ]
}

pub fn display_help() {
    log_version!();
    log_block_start!("sun - Show sunrise and sunset times");
    log_block_start!("Usage: devparams sun [--at \"YYYY-MM-DD HH:MM:SS\"]");
    log_block_start!("Options:");
    log_indented!("--at <time>   UTC time selecting the day (default: now)");
    log_end!();
}
