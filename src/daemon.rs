//! The long-running clock service.
//!
//! Ticks are aligned to minute boundaries. Between ticks the loop sleeps in short
//! slices so a shutdown signal is honoured quickly, and retries the NTP sync when
//! the clock was found insane at startup.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use crate::clock::delay_to_next_minute;
use crate::commands::open_service;
use crate::constants::{CLOCK_TICK_INTERVAL_SECS, LOOP_SLEEP_SLICE_MS};
use crate::events::{EventSink, JsonLinesSink, LogSink};
use crate::io::{lock, signals};
use crate::parameters::Parameters;
use crate::time_source::TimeSource;

fn tick_interval() -> ChronoDuration {
    ChronoDuration::seconds(CLOCK_TICK_INTERVAL_SECS as i64)
}

/// Next minute boundary strictly after `now`.
fn following_minute(now: DateTime<Utc>) -> DateTime<Utc> {
    let delay = delay_to_next_minute(now);
    if delay.is_zero() {
        now + tick_interval()
    } else {
        now + ChronoDuration::from_std(delay).unwrap_or_else(|_| tick_interval())
    }
}

/// Drive `service` until `running` is cleared, or until `max_ticks` ticks ran.
pub fn run_loop(
    service: &mut Parameters,
    time: &dyn TimeSource,
    running: &AtomicBool,
    max_ticks: Option<u64>,
) -> Result<()> {
    let first_delay = service.on_start();
    let mut next_tick = time.now() + ChronoDuration::from_std(first_delay)?;
    let mut ticks = 0u64;
    log_debug!("First tick at {next_tick}");

    while running.load(Ordering::SeqCst) {
        let now = time.now();

        if now >= next_tick {
            if let Err(e) = service.tick() {
                log_error!("Clock tick failed: {e:#}");
            }
            ticks += 1;
            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            next_tick += tick_interval();
            if next_tick <= now {
                log_debug!("Clock jumped forward, realigning ticks");
                next_tick = following_minute(now);
            }
        } else if next_tick - now > tick_interval() {
            log_debug!("Clock jumped backward, realigning ticks");
            next_tick = following_minute(now);
        }

        service.run_pending_sync();

        let remaining = (next_tick - time.now())
            .to_std()
            .unwrap_or(StdDuration::ZERO);
        time.sleep(remaining.min(StdDuration::from_millis(LOOP_SLEEP_SLICE_MS)));
    }

    Ok(())
}

/// Run the service until a shutdown signal. Returns false when another
/// instance already runs.
pub fn run_daemon(events_json: bool) -> Result<bool> {
    log_version!();

    let Some(instance_lock) = lock::acquire_lock()? else {
        return Ok(false);
    };
    let signal_state = signals::setup_signal_handler()?;

    let sink: Box<dyn EventSink> = if events_json {
        Box::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(LogSink)
    };
    let mut service = open_service(sink)?;

    let config = service.get_module_config();
    log_block_start!("Device parameters");
    log_indented!("Position: {}", config.position);
    log_indented!(
        "Timezone: {}",
        config.timezone.as_deref().unwrap_or("UTC")
    );
    log_indented!(
        "Country: {}",
        config.country.country.as_deref().unwrap_or("unknown")
    );
    if config.sun.sunrise != 0 {
        log_indented!("Sunrise: {}", config.sun.sunrise_iso);
    }
    if config.sun.sunset != 0 {
        log_indented!("Sunset: {}", config.sun.sunset_iso);
    }

    let time = Arc::new(crate::time_source::RealTimeSource);
    run_loop(&mut service, time.as_ref(), &signal_state.running, None)?;

    if let Err(e) = instance_lock.release() {
        log_warning!("{e:#}");
    }
    log_block_start!("Stopped");
    log_end!();
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryStore, Settings};
    use crate::events::{ChannelSink, ParametersEvent};
    use crate::system::RecordingRunner;
    use crate::time_source::SimulatedTimeSource;
    use chrono::{TimeZone, Timelike};
    use std::sync::mpsc::channel;

    fn service_at(
        start: DateTime<Utc>,
        settings: Settings,
    ) -> (
        Parameters,
        Arc<SimulatedTimeSource>,
        std::sync::mpsc::Receiver<crate::events::Event>,
    ) {
        let time = Arc::new(SimulatedTimeSource::new(start));
        let (tx, rx) = channel();
        let mut service = Parameters::new(
            Box::new(MemoryStore::new(settings)),
            time.clone(),
            Box::new(RecordingRunner::new(0)),
            Box::new(ChannelSink::new(tx)),
        )
        .unwrap();
        service.configure().unwrap();
        (service, time, rx)
    }

    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.system.manage_system = false;
        settings
    }

    #[test]
    fn test_following_minute() {
        let on = Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 0).unwrap();
        assert_eq!(following_minute(on), on + ChronoDuration::seconds(60));
        let off = on + ChronoDuration::seconds(12);
        assert_eq!(following_minute(off), on + ChronoDuration::seconds(60));
    }

    #[test]
    fn test_loop_ticks_on_minute_boundaries() {
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 30).unwrap();
        let (mut service, time, rx) = service_at(start, quiet_settings());
        let running = AtomicBool::new(true);

        run_loop(&mut service, time.as_ref(), &running, Some(3)).unwrap();

        let ticks: Vec<u32> = rx
            .try_iter()
            .filter_map(|e| match e.event {
                ParametersEvent::TimeNow(now) => Some(now.time.minute),
                _ => None,
            })
            .collect();
        // London is UTC+1 in June
        assert_eq!(ticks, vec![1, 2, 3]);
        assert_eq!(time.now().second(), 0);
    }

    #[test]
    fn test_loop_stops_when_not_running() {
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 30).unwrap();
        let (mut service, time, rx) = service_at(start, quiet_settings());
        let running = AtomicBool::new(false);

        run_loop(&mut service, time.as_ref(), &running, None).unwrap();
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_loop_retries_sync_for_insane_clock() {
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 0).unwrap();
        let mut settings = quiet_settings();
        settings.timestamp = (start + ChronoDuration::days(1)).timestamp();
        let (mut service, time, _rx) = service_at(start, settings);
        let running = AtomicBool::new(true);

        // Ticks at 10:00 and 10:01, the sync is due right after the 10:01 tick
        run_loop(&mut service, time.as_ref(), &running, Some(3)).unwrap();
        assert!(!service.is_syncing());
    }
}
