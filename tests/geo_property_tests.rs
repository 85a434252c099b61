use chrono::NaiveDate;
use devparams::geo::{
    DevicePosition, closest_timezone_at, compute_sun_times, find_timezone,
};
use devparams::hostname::validate_hostname;
use proptest::prelude::*;

/// Generate valid latitude values
fn latitude_strategy() -> impl Strategy<Value = f64> {
    -90.0..=90.0
}

/// Generate valid longitude values
fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2040, 1u32..=365).prop_map(|(year, ordinal)| {
        NaiveDate::from_yo_opt(year, ordinal).unwrap_or_default()
    })
}

/// Property tests for position validation and timezone lookup
#[cfg(test)]
mod position_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_valid_coordinates_are_accepted(
            lat in latitude_strategy(),
            lon in longitude_strategy()
        ) {
            let position = DevicePosition::new(lat, lon);
            prop_assert!(position.is_ok());
        }

        #[test]
        fn test_out_of_range_latitude_is_rejected(
            lat in prop_oneof![90.0001f64..1000.0, -1000.0f64..-90.0001],
            lon in longitude_strategy()
        ) {
            let err = DevicePosition::new(lat, lon).unwrap_err();
            prop_assert_eq!(err.kind(), "InvalidParameter");
        }

        #[test]
        fn test_out_of_range_longitude_is_rejected(
            lat in latitude_strategy(),
            lon in prop_oneof![180.0001f64..1000.0, -1000.0f64..-180.0001]
        ) {
            prop_assert!(DevicePosition::new(lat, lon).is_err());
        }

        /// Every valid position resolves to some timezone, exact or nautical
        #[test]
        fn test_timezone_always_found(
            lat in latitude_strategy(),
            lon in longitude_strategy()
        ) {
            let position = DevicePosition::new(lat, lon).unwrap();
            prop_assert!(find_timezone(&position).is_some());
            prop_assert!(closest_timezone_at(&position).is_some());
        }
    }
}

/// Property tests for sun time computation
#[cfg(test)]
mod sun_times_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any position and date computes without error, including polar days
        #[test]
        fn test_sun_times_never_fail(
            lat in latitude_strategy(),
            lon in longitude_strategy(),
            date in date_strategy()
        ) {
            let position = DevicePosition::new(lat, lon).unwrap();
            let tz = find_timezone(&position).unwrap_or(chrono_tz::UTC);
            prop_assert!(compute_sun_times(&position, date, tz).is_ok());
        }

        /// Events that exist belong to the requested local day
        #[test]
        fn test_events_fall_on_requested_date(
            lat in latitude_strategy(),
            lon in longitude_strategy(),
            date in date_strategy()
        ) {
            let position = DevicePosition::new(lat, lon).unwrap();
            let tz = find_timezone(&position).unwrap_or(chrono_tz::UTC);
            let times = compute_sun_times(&position, date, tz).unwrap();
            if let Some(sunrise) = times.sunrise {
                prop_assert_eq!(sunrise.date_naive(), date);
            }
            if let Some(sunset) = times.sunset {
                prop_assert_eq!(sunset.date_naive(), date);
            }
        }

        /// Away from the polar circles both events exist and are less than a day apart
        #[test]
        fn test_sun_times_exist_at_moderate_latitudes(
            lat in -60.0f64..60.0,
            lon in longitude_strategy(),
            date in date_strategy()
        ) {
            prop_assume!(lat != 0.0 || lon != 0.0);
            let position = DevicePosition::new(lat, lon).unwrap();
            let tz = find_timezone(&position).unwrap_or(chrono_tz::UTC);
            let times = compute_sun_times(&position, date, tz).unwrap();

            let sunrise = times.sunrise.expect("sunrise");
            let sunset = times.sunset.expect("sunset");
            prop_assert!((sunset - sunrise).num_hours().abs() < 24);

            let summary = times.summary();
            prop_assert!(summary.sunrise > 0);
            prop_assert!(!summary.sunset_iso.is_empty());
        }
    }
}

/// Property tests for device name validation
#[cfg(test)]
mod hostname_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_valid_hostnames_are_accepted(
            labels in prop::collection::vec("[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?", 1..4)
        ) {
            let name = labels.join(".");
            let validated = validate_hostname(&name).unwrap();
            prop_assert_eq!(validated.name, name);
        }

        #[test]
        fn test_invalid_characters_are_rejected(
            prefix in "[a-z]{1,8}",
            bad in "[_!@#$%^&* ]",
            suffix in "[a-z]{1,8}"
        ) {
            let name = format!("{prefix}{bad}{suffix}");
            let err = validate_hostname(&name).unwrap_err();
            prop_assert_eq!(err.kind(), "InvalidParameter");
        }

        #[test]
        fn test_labels_cannot_start_or_end_with_hyphen(label in "[a-z]{1,10}") {
            let leading = format!("-{label}");
            let trailing = format!("{label}-");
            prop_assert!(validate_hostname(&leading).is_err());
            prop_assert!(validate_hostname(&trailing).is_err());
        }
    }
}
