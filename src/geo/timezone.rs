//! Timezone lookup from coordinates.
//!
//! The exact lookup uses the timezone polygons bundled with `tzf-rs`. When a point
//! falls outside every polygon, or the name it yields is unknown to `chrono-tz`, the
//! closest lookup falls back to the nautical `Etc/GMT±N` zone of the longitude.

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

use super::DevicePosition;

static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Timezone whose polygon contains the position.
pub fn timezone_at(position: &DevicePosition) -> Option<Tz> {
    let name = FINDER.get_tz_name(position.longitude, position.latitude);
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}

/// Nautical timezone of the position's longitude.
///
/// Note that `Etc/GMT` names have the inverted sign: 30°E is `Etc/GMT-2`.
pub fn closest_timezone_at(position: &DevicePosition) -> Option<Tz> {
    if !position.longitude.is_finite() {
        return None;
    }
    let offset = (position.longitude / 15.0).round() as i32;
    let name = match offset {
        0 => "Etc/GMT".to_string(),
        o if o > 0 => format!("Etc/GMT-{o}"),
        o => format!("Etc/GMT+{}", -o),
    };
    name.parse::<Tz>().ok()
}

/// Exact lookup, then the nautical fallback.
pub fn find_timezone(position: &DevicePosition) -> Option<Tz> {
    timezone_at(position).or_else(|| {
        log_debug!("No timezone polygon at {position}, using closest timezone");
        closest_timezone_at(position)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64) -> DevicePosition {
        DevicePosition::new(lat, lon).unwrap()
    }

    #[test]
    fn test_known_cities() {
        let cases = [
            (52.2040, 0.1208, "Europe/London"),
            (48.8566, 2.3522, "Europe/Paris"),
            (40.7128, -74.0060, "America/New_York"),
            (35.6762, 139.6503, "Asia/Tokyo"),
            (-33.8688, 151.2093, "Australia/Sydney"),
        ];
        for (lat, lon, expected) in cases {
            let tz = timezone_at(&pos(lat, lon)).unwrap();
            assert_eq!(tz.name(), expected, "timezone at ({lat}, {lon})");
        }
    }

    #[test]
    fn test_nautical_fallback_signs() {
        assert_eq!(closest_timezone_at(&pos(0.0, 30.0)).unwrap().name(), "Etc/GMT-2");
        assert_eq!(closest_timezone_at(&pos(0.0, -75.0)).unwrap().name(), "Etc/GMT+5");
        assert_eq!(closest_timezone_at(&pos(10.0, 3.0)).unwrap().name(), "Etc/GMT");
        assert_eq!(closest_timezone_at(&pos(0.0, 180.0)).unwrap().name(), "Etc/GMT-12");
        assert_eq!(closest_timezone_at(&pos(0.0, -180.0)).unwrap().name(), "Etc/GMT+12");
    }

    #[test]
    fn test_find_timezone_always_resolves() {
        // Middle of the South Pacific
        assert!(find_timezone(&pos(-40.0, -130.0)).is_some());
        assert!(find_timezone(&pos(51.5074, -0.1278)).is_some());
    }
}
