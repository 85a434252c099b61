//! Country lookup from coordinates.
//!
//! Reverse geocoding picks the nearest known city; its ISO 3166 alpha-2 code gives
//! the country name.

use once_cell::sync::Lazy;
use reverse_geocoder::ReverseGeocoder;
use serde::{Deserialize, Serialize};

use super::DevicePosition;
use crate::constants::{DEFAULT_COUNTRY, DEFAULT_COUNTRY_ALPHA2};

static GEOCODER: Lazy<ReverseGeocoder> = Lazy::new(ReverseGeocoder::new);

/// Country of the device. Both fields are empty when the lookup found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub country: Option<String>,
    pub alpha2: Option<String>,
}

impl Country {
    pub fn unknown() -> Self {
        Self {
            country: None,
            alpha2: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.alpha2.is_some()
    }
}

impl Default for Country {
    fn default() -> Self {
        Self {
            country: Some(DEFAULT_COUNTRY.to_string()),
            alpha2: Some(DEFAULT_COUNTRY_ALPHA2.to_string()),
        }
    }
}

/// Find the country of the nearest city to `position`.
///
/// The first call loads the city database, which takes a moment on slow devices.
pub fn find_country(position: &DevicePosition) -> Country {
    let result = GEOCODER.search((position.latitude, position.longitude));
    let record = result.record;
    if record.cc.is_empty() {
        return Country::unknown();
    }

    let name = rust_iso3166::from_alpha2(&record.cc).map(|code| code.name.to_string());
    log_debug!(
        "Nearest city to {position}: {} ({}) -> {:?}",
        record.name,
        record.cc,
        name
    );

    Country {
        country: name,
        alpha2: Some(record.cc.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_country_amsterdam() {
        let country = find_country(&DevicePosition::new(52.379_189, 4.899_431).unwrap());
        assert_eq!(country.alpha2.as_deref(), Some("NL"));
        assert_eq!(country.country.as_deref(), Some("Netherlands"));
    }

    #[test]
    fn test_find_country_new_york() {
        let country = find_country(&DevicePosition::new(40.7128, -74.0060).unwrap());
        assert_eq!(country.alpha2.as_deref(), Some("US"));
        assert!(country.is_known());
    }

    #[test]
    fn test_default_country() {
        let country = Country::default();
        assert_eq!(country.alpha2.as_deref(), Some("GB"));
        assert!(!Country::unknown().is_known());
    }
}
