//! Application-wide constants and defaults.

// # Default settings (Raspberry Pi Foundation, Cambridge)
pub const DEFAULT_LATITUDE: f64 = 52.2040;
pub const DEFAULT_LONGITUDE: f64 = 0.1208;
pub const DEFAULT_COUNTRY: &str = "United Kingdom";
pub const DEFAULT_COUNTRY_ALPHA2: &str = "GB";
pub const DEFAULT_TIMEZONE: &str = "Europe/London";
pub const DEFAULT_CLOCK_DEVICE_ID: &str = "clock";
pub const CLOCK_DEVICE_NAME: &str = "Clock";

// # Coordinate ranges
pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

// # Hostname rules
pub const HOSTNAME_PATTERN: &str = r"^(([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]*[a-zA-Z0-9])\.)*([A-Za-z0-9]|[A-Za-z0-9][A-Za-z0-9\-]*[A-Za-z0-9])$";
pub const MAXIMUM_HOSTNAME_LENGTH: usize = 253;
pub const MAXIMUM_HOSTNAME_LABEL_LENGTH: usize = 63;
/// Loopback address Debian maps the hostname to in /etc/hosts
pub const HOSTS_LOOPBACK_ADDRESS: &str = "127.0.1.1";

// # Clock task
pub const CLOCK_TICK_INTERVAL_SECS: u64 = 60;
pub const NTP_SYNC_INTERVAL_SECS: u64 = 60;
/// Sun times are refreshed once a day at this local time (hour, minute)
pub const SUN_REFRESH_TIME: (u32, u32) = (0, 5);
/// Granularity of the daemon loop sleeps, so shutdown stays responsive
pub const LOOP_SLEEP_SLICE_MS: u64 = 250;

// # System integration
pub const SYSTEM_ZONEINFO_DIR: &str = "/usr/share/zoneinfo";
pub const SYSTEM_LOCALTIME: &str = "/etc/localtime";
pub const SYSTEM_TIMEZONE: &str = "/etc/timezone";
pub const SYSTEM_HOSTNAME: &str = "/etc/hostname";
pub const SYSTEM_HOSTS: &str = "/etc/hosts";
pub const TIMEZONE_RECONFIGURE_COMMAND: &str = "/usr/sbin/dpkg-reconfigure -f noninteractive tzdata";
pub const TIMEZONE_RECONFIGURE_TIMEOUT_SECS: f64 = 15.0;
pub const NTP_SYNC_COMMAND: &str = "/usr/sbin/ntpdate-debian";
pub const NTP_SYNC_TIMEOUT_SECS: f64 = 60.0;

// # Files
pub const CONFIG_DIR_NAME: &str = "devparams";
pub const CONFIG_FILE_NAME: &str = "parameters.toml";
pub const LOCK_FILE_NAME: &str = "devparams.lock";

// # Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
