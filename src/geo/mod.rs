//! Geographic derivations from the device position.
//!
//! - [`solar`]: sunrise/sunset times for a date, in the position's timezone
//! - [`timezone`]: timezone lookup from coordinates, with a nautical fallback
//! - [`country`]: reverse geocoding of the position to a country
//!
//! Every derivation is skipped for the unspecified `(0, 0)` position.

pub mod country;
pub mod solar;
pub mod timezone;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ParameterError;

pub use country::{Country, find_country};
pub use solar::{SunSummary, SunTimes, compute_sun_times};
pub use timezone::{closest_timezone_at, find_timezone, timezone_at};

/// Latitude/longitude pair of the device, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl DevicePosition {
    /// Build a position, checking both coordinates are finite and in range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParameterError> {
        if !latitude.is_finite() || !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&latitude) {
            return Err(ParameterError::invalid(format!(
                "Parameter \"latitude\" is invalid: must be between {MINIMUM_LATITUDE} and {MAXIMUM_LATITUDE} (got {latitude})"
            )));
        }
        if !longitude.is_finite()
            || !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&longitude)
        {
            return Err(ParameterError::invalid(format!(
                "Parameter \"longitude\" is invalid: must be between {MINIMUM_LONGITUDE} and {MAXIMUM_LONGITUDE} (got {longitude})"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// `(0, 0)` is how an unset position is stored.
    pub fn is_unspecified(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl Default for DevicePosition {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
        }
    }
}

impl std::fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude >= 0.0 { "N" } else { "S" };
        let ew = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew}",
            self.latitude.abs(),
            self.longitude.abs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_bounds_are_inclusive() {
        assert!(DevicePosition::new(90.0, 180.0).is_ok());
        assert!(DevicePosition::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_position_out_of_range() {
        let err = DevicePosition::new(90.5, 0.0).unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");
        assert!(err.to_string().contains("latitude"));

        let err = DevicePosition::new(0.0, -180.01).unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn test_position_rejects_nan() {
        assert!(DevicePosition::new(f64::NAN, 0.0).is_err());
        assert!(DevicePosition::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_unspecified_position() {
        assert!(DevicePosition::new(0.0, 0.0).unwrap().is_unspecified());
        assert!(!DevicePosition::new(0.0, 1.0).unwrap().is_unspecified());
        assert!(!DevicePosition::default().is_unspecified());
    }

    #[test]
    fn test_display() {
        let pos = DevicePosition::new(40.7128, -74.006).unwrap();
        assert_eq!(pos.to_string(), "40.7128°N, 74.0060°W");
    }
}
