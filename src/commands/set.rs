//! Set command: change the position or the device name.

use anyhow::Result;

use crate::events::LogSink;

/// What `set` changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SetField {
    Position { latitude: f64, longitude: f64 },
    Hostname(String),
}

/// Parse `set` arguments: `position <lat> <lon>` or `hostname <name>`.
pub fn parse_set_args(args: &[String]) -> Result<SetField, String> {
    match args {
        [field, lat, lon] if field == "position" => {
            let latitude = lat
                .parse::<f64>()
                .map_err(|_| format!("Invalid latitude: {lat}"))?;
            let longitude = lon
                .parse::<f64>()
                .map_err(|_| format!("Invalid longitude: {lon}"))?;
            Ok(SetField::Position {
                latitude,
                longitude,
            })
        }
        [field, name] if field == "hostname" => Ok(SetField::Hostname(name.clone())),
        [field, ..] if field == "position" => {
            Err("Usage: devparams set position <latitude> <longitude>".to_string())
        }
        [field, ..] if field == "hostname" => {
            Err("Usage: devparams set hostname <name>".to_string())
        }
        [field, ..] => Err(format!("Unknown field: {field}")),
        [] => Err("Missing field. Usage: devparams set <field> <value>...".to_string()),
    }
}

/// Handle the set command.
pub fn handle_set_command(field: &SetField) -> Result<()> {
    log_version!();
    let mut service = super::open_service(Box::new(LogSink))?;

    match field {
        SetField::Position {
            latitude,
            longitude,
        } => {
            service.set_position(*latitude, *longitude)?;
            let config = service.get_module_config();
            log_block_start!("Position updated to {}", config.position);
            log_indented!(
                "Timezone: {}",
                config.timezone.as_deref().unwrap_or("unknown")
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
        }
        SetField::Hostname(name) => {
            if service.set_hostname(name)? {
                log_block_start!("Device name set to {name}");
            } else {
                log_block_start!("Device name unchanged");
                log_indented!("The hostname file could not be written");
            }
        }
    }

    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("set - Update device parameters");
    log_block_start!("Usage:");
    log_indented!("devparams set position <latitude> <longitude>");
    log_indented!("devparams set hostname <name>");
    log_block_start!("Setting the position also updates the timezone, the country");
    log_indented!("and today's sunrise/sunset times.");
    log_block_start!("Examples:");
    log_indented!("devparams set position 48.8566 2.3522");
    log_indented!("devparams set hostname kitchen-pi");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(
            parse_set_args(&args(&["position", "48.8566", "-2.5"])),
            Ok(SetField::Position {
                latitude: 48.8566,
                longitude: -2.5
            })
        );
        assert!(parse_set_args(&args(&["position", "north", "2"])).is_err());
        assert!(parse_set_args(&args(&["position", "48.0"])).is_err());
    }

    #[test]
    fn test_parse_hostname() {
        assert_eq!(
            parse_set_args(&args(&["hostname", "kitchen"])),
            Ok(SetField::Hostname("kitchen".to_string()))
        );
        assert!(parse_set_args(&args(&["timezone", "Europe/Paris"])).is_err());
        assert!(parse_set_args(&[]).is_err());
    }
}
