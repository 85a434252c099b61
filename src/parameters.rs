//! The device parameters service.
//!
//! [`Parameters`] owns the settings and every derived value: timezone, country,
//! today's sun times and the clock device. Collaborators are injected so the
//! service runs the same way against the real system and in tests:
//!
//! - a [`SettingsStore`] for persistence,
//! - a [`TimeSource`] for the current time,
//! - a [`CommandRunner`] for system commands,
//! - an [`EventSink`] for emitted events.
//!
//! Failures the caller must tell apart are [`ParameterError`]s wrapped in
//! `anyhow::Error`.

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::clock::{ClockTask, ClockTime, delay_to_next_minute, format_time, is_clock_insane};
use crate::config::{Settings, SettingsStore};
use crate::constants::CLOCK_DEVICE_NAME;
use crate::error::ParameterError;
use crate::events::{Event, EventSink, ParametersEvent};
use crate::geo::{
    self, Country, DevicePosition, SunSummary, SunTimes, compute_sun_times, find_country,
};
use crate::hostname::{HostnameFiles, validate_hostname};
use crate::system::{self, CommandRunner, SystemTimezone};
use crate::time_source::TimeSource;

/// Everything the module exposes in one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleConfig {
    pub hostname: Option<String>,
    pub position: DevicePosition,
    pub sun: SunSummary,
    pub country: Country,
    pub timezone: Option<String>,
}

/// The clock device with its current data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockDevice {
    pub uuid: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub name: String,
    #[serde(flatten)]
    pub time: ClockTime,
    pub sunrise: i64,
    pub sunset: i64,
}

pub struct Parameters {
    store: Box<dyn SettingsStore>,
    settings: Settings,
    time: Arc<dyn TimeSource>,
    runner: Box<dyn CommandRunner>,
    events: Box<dyn EventSink>,
    sun: SunTimes,
    clock: ClockTask,
}

impl Parameters {
    /// Load the settings and build the service. Call [`Parameters::configure`]
    /// before use.
    pub fn new(
        store: Box<dyn SettingsStore>,
        time: Arc<dyn TimeSource>,
        runner: Box<dyn CommandRunner>,
        events: Box<dyn EventSink>,
    ) -> Result<Self> {
        let settings = store.load()?;
        Ok(Self {
            store,
            settings,
            time,
            runner,
            events,
            sun: SunTimes::default(),
            clock: ClockTask::new(),
        })
    }

    /// Derive what the saved settings lack and compute today's sun times.
    pub fn configure(&mut self) -> Result<()> {
        if !self.settings.country.is_known()
            && let Err(e) = self.set_country()
        {
            log_warning!("Unable to set country: {e:#}");
        }

        if self.settings.tz().is_none() {
            log_info!(
                "No timezone defined, using UTC. It will be updated when the position is set."
            );
        }

        self.set_sun()?;
        log_debug!(
            "Configured at {} ({})",
            self.settings.position,
            self.timezone_name()
        );
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sun_times(&self) -> &SunTimes {
        &self.sun
    }

    /// Timezone in use: the saved one, or UTC when unset.
    pub fn tz(&self) -> Tz {
        self.settings.tz().unwrap_or(chrono_tz::UTC)
    }

    fn timezone_name(&self) -> &str {
        self.settings.timezone.as_deref().unwrap_or("UTC")
    }

    fn today(&self) -> NaiveDate {
        self.time.now().with_timezone(&self.tz()).date_naive()
    }

    /// Save `update` applied to the settings. The in-memory copy only changes once
    /// the store accepted it.
    fn save_with(&mut self, update: impl FnOnce(&mut Settings), error: &str) -> Result<()> {
        let mut candidate = self.settings.clone();
        update(&mut candidate);
        if let Err(e) = self.store.save(&candidate) {
            log_error!("{error}: {e:#}");
            return Err(ParameterError::command(error).into());
        }
        self.settings = candidate;
        Ok(())
    }

    fn emit(&mut self, event: ParametersEvent, for_clock: bool) {
        let event = if for_clock {
            Event::for_device(event, &self.settings.clock_device_id)
        } else {
            Event::new(event)
        };
        if let Err(e) = self.events.send(event) {
            log_warning!("Unable to send event: {e:#}");
        }
    }

    fn hostname_files(&self) -> HostnameFiles {
        HostnameFiles::new(
            self.settings.system.hostname_path.clone(),
            self.settings.system.hosts_path.clone(),
        )
    }

    pub fn get_module_config(&self) -> ModuleConfig {
        ModuleConfig {
            hostname: self.get_hostname(),
            position: self.get_position(),
            sun: self.get_sun(),
            country: self.get_country(),
            timezone: self.get_timezone(),
        }
    }

    /// Devices of the module, keyed by id. Only the clock exists.
    pub fn get_module_devices(&self) -> BTreeMap<String, ClockDevice> {
        let summary = self.sun.summary();
        let device = ClockDevice {
            uuid: self.settings.clock_device_id.clone(),
            device_type: "clock".to_string(),
            name: CLOCK_DEVICE_NAME.to_string(),
            time: format_time(self.time.now().timestamp(), self.tz()),
            sunrise: summary.sunrise,
            sunset: summary.sunset,
        };
        BTreeMap::from([(device.uuid.clone(), device)])
    }

    /// Rename the device. Sends `parameters.hostname.update` when the name was
    /// written.
    pub fn set_hostname(&mut self, hostname: &str) -> Result<bool> {
        let name = validate_hostname(hostname)?;
        let written = self.hostname_files().set_hostname(&name)?;
        if written {
            log_info!("Device name set to {name}");
            self.emit(
                ParametersEvent::HostnameUpdate {
                    hostname: name.name,
                },
                false,
            );
        }
        Ok(written)
    }

    pub fn get_hostname(&self) -> Option<String> {
        self.hostname_files().get_hostname()
    }

    /// Save a new position, then derive timezone, country and sun times from it
    /// and send a fresh time event.
    pub fn set_position(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        let position = DevicePosition::new(latitude, longitude)?;
        self.save_with(|s| s.position = position, "Unable to save position")?;
        log_info!("Position set to {position}");

        self.set_timezone()?;
        self.set_country()?;
        self.set_sun()?;
        self.tick()
    }

    pub fn get_position(&self) -> DevicePosition {
        self.settings.position
    }

    pub fn get_sun(&self) -> SunSummary {
        self.sun.summary()
    }

    /// Recompute today's sun times for the saved position.
    pub fn set_sun(&mut self) -> Result<()> {
        self.sun = compute_sun_times(&self.settings.position, self.today(), self.tz())?;
        log_debug!(
            "Found sunrise: {:?} sunset: {:?}",
            self.sun.sunrise,
            self.sun.sunset
        );
        Ok(())
    }

    /// Derive the country from the position and send
    /// `parameters.country.update`. Nothing happens for the unspecified position.
    pub fn set_country(&mut self) -> Result<()> {
        let position = self.settings.position;
        if position.is_unspecified() {
            log_debug!("Unable to set country from unspecified position");
            return Ok(());
        }

        let country = find_country(&position);
        log_debug!("Found country from position {position}: {country:?}");
        let saved = country.clone();
        self.save_with(|s| s.country = saved, "Unable to save country")?;
        self.emit(ParametersEvent::CountryUpdate(country), false);
        Ok(())
    }

    pub fn get_country(&self) -> Country {
        self.settings.country.clone()
    }

    /// Derive the timezone from the position, save it and apply it to the system.
    ///
    /// Returns false when the position is unspecified, no timezone was found, or
    /// the system could not be configured.
    pub fn set_timezone(&mut self) -> Result<bool> {
        let position = self.settings.position;
        if position.is_unspecified() {
            log_warning!("Unable to set timezone from unspecified position");
            return Ok(false);
        }

        let Some(tz) = geo::find_timezone(&position) else {
            log_warning!("Unable to set device timezone because it was not found");
            return Ok(false);
        };
        let name = tz.name().to_string();

        log_debug!("Save new timezone: {name}");
        let saved = name.clone();
        self.save_with(|s| s.timezone = Some(saved), "Unable to save timezone")?;

        if !self.settings.system.manage_system {
            return Ok(true);
        }

        let system_timezone = SystemTimezone::from_settings(&self.settings.system);
        system_timezone.apply(&name, self.runner.as_ref())
    }

    pub fn get_timezone(&self) -> Option<String> {
        self.settings.timezone.clone()
    }

    /// Synchronize the system clock over NTP. Can take up to a minute.
    pub fn sync_time(&mut self) -> Result<bool> {
        system::sync_time(self.runner.as_ref(), &self.settings.system.ntp_command)
    }

    pub fn is_syncing(&self) -> bool {
        self.clock.is_syncing()
    }

    /// Start of the clock. Begins NTP retries when the system time is behind the
    /// last saved tick, and returns the delay until the first tick.
    pub fn on_start(&mut self) -> StdDuration {
        let now = self.time.now();
        if is_clock_insane(self.settings.timestamp, now) {
            log_info!(
                "Device time seems to be invalid ({}), starting time synchronization",
                now.with_timezone(&self.tz()).format("%Y-%m-%d %H:%M")
            );
            self.clock.start_sync(now);
        }
        delay_to_next_minute(now)
    }

    /// Retry the NTP sync if one is due.
    pub fn run_pending_sync(&mut self) {
        let now = self.time.now();
        if !self.clock.sync_due(now) {
            return;
        }

        let synced = self.sync_time().unwrap_or_else(|e| {
            log_warning!("Time synchronization failed: {e:#}");
            false
        });
        if synced {
            log_info!(
                "Time synchronized with NTP server ({})",
                self.time.now().with_timezone(&self.tz()).format("%Y-%m-%d %H:%M")
            );
        }
        self.clock.sync_attempted(synced, self.time.now());
    }

    /// One clock tick: send the time events, refresh sun times after midnight and
    /// remember the tick timestamp.
    pub fn tick(&mut self) -> Result<()> {
        let now = format_time(self.time.now().timestamp(), self.tz());
        let outcome = self.clock.tick(&now, &self.sun);

        for event in outcome.events {
            self.emit(event, true);
        }

        if outcome.refresh_sun {
            self.set_sun()?;
        }

        if let Some(timestamp) = outcome.persist_timestamp
            && let Err(e) = self.save_with(|s| s.timestamp = timestamp, "Unable to save timestamp")
        {
            log_warning!("{e}");
        }

        Ok(())
    }
}
