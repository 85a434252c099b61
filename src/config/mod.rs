//! Persistent settings of the device parameters service.
//!
//! Settings live in a single TOML file, `parameters.toml`, under
//! `$XDG_CONFIG_HOME/devparams/` (or the directory given with `--config`):
//!
//! ```toml
//! timezone = "Europe/London"   # Derived from the position, "" when unknown
//! timestamp = 0                # Last clock tick, used to detect an insane clock
//! clock_device_id = "clock"
//!
//! [position]
//! latitude = 52.204
//! longitude = 0.1208
//!
//! [country]
//! country = "United Kingdom"
//! alpha2 = "GB"
//!
//! [system]
//! manage_system = true         # Apply timezone changes to the system files
//! zoneinfo_dir = "/usr/share/zoneinfo"
//! localtime_path = "/etc/localtime"
//! timezone_path = "/etc/timezone"
//! hostname_path = "/etc/hostname"
//! hosts_path = "/etc/hosts"
//! timezone_command = "/usr/sbin/dpkg-reconfigure -f noninteractive tzdata"
//! ntp_command = "/usr/sbin/ntpdate-debian"
//! ```
//!
//! Missing keys take their defaults, so a partial file is valid. A missing file is
//! created with the defaults on first load.

pub mod loading;
pub mod store;
pub mod validation;


use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

use crate::constants::*;
use crate::geo::{Country, DevicePosition};

pub use loading::{get_config_path, get_custom_config_dir, load_from_path, save_to_path, set_config_dir};
pub use store::{FileStore, MemoryStore, SettingsStore};
pub use validation::validate_settings;

/// All persisted settings.
///
/// Scalar fields come first so the TOML output keeps them above the tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IANA timezone name derived from the position
    #[serde(with = "timezone_name")]
    pub timezone: Option<String>,
    /// Unix timestamp of the last clock tick
    pub timestamp: i64,
    /// Identifier the clock device's events are sent with
    pub clock_device_id: String,
    pub position: DevicePosition,
    pub country: Country,
    pub system: SystemSettings,
}

/// TOML has no null: an unknown timezone is stored as an empty string so it
/// does not fall back to the default on reload.
mod timezone_name {
    use super::*;

    pub fn serialize<S: Serializer>(name: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(name.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok((!name.trim().is_empty()).then_some(name))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: Some(DEFAULT_TIMEZONE.to_string()),
            timestamp: 0,
            clock_device_id: DEFAULT_CLOCK_DEVICE_ID.to_string(),
            position: DevicePosition::default(),
            country: Country::default(),
            system: SystemSettings::default(),
        }
    }
}

/// Where and whether system-wide state (timezone, hostname, clock) is managed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    /// When false, timezone changes stay in the settings file only
    pub manage_system: bool,
    pub zoneinfo_dir: PathBuf,
    pub localtime_path: PathBuf,
    pub timezone_path: PathBuf,
    pub hostname_path: PathBuf,
    pub hosts_path: PathBuf,
    /// Run after writing the timezone files; skipped when empty
    pub timezone_command: String,
    pub ntp_command: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            manage_system: true,
            zoneinfo_dir: PathBuf::from(SYSTEM_ZONEINFO_DIR),
            localtime_path: PathBuf::from(SYSTEM_LOCALTIME),
            timezone_path: PathBuf::from(SYSTEM_TIMEZONE),
            hostname_path: PathBuf::from(SYSTEM_HOSTNAME),
            hosts_path: PathBuf::from(SYSTEM_HOSTS),
            timezone_command: TIMEZONE_RECONFIGURE_COMMAND.to_string(),
            ntp_command: NTP_SYNC_COMMAND.to_string(),
        }
    }
}

impl Settings {
    /// Parsed timezone, if set and known.
    pub fn tz(&self) -> Option<chrono_tz::Tz> {
        self.timezone.as_deref().and_then(|name| name.parse().ok())
    }
}
