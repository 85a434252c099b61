//! Settings validation.

use anyhow::Result;

use super::Settings;
use crate::geo::DevicePosition;

/// Reject settings a running service could not work with.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    let pos = settings.position;
    DevicePosition::new(pos.latitude, pos.longitude)?;

    if let Some(name) = settings.timezone.as_deref()
        && name.parse::<chrono_tz::Tz>().is_err()
    {
        anyhow::bail!("timezone \"{name}\" is not a known IANA timezone");
    }

    if settings.clock_device_id.trim().is_empty() {
        anyhow::bail!("clock_device_id cannot be empty");
    }

    if settings.system.ntp_command.trim().is_empty() {
        anyhow::bail!("system.ntp_command cannot be empty");
    }

    Ok(())
}
