//! System timezone configuration (Debian layout).

use anyhow::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::console::CommandRunner;
use crate::config::SystemSettings;
use crate::constants::TIMEZONE_RECONFIGURE_TIMEOUT_SECS;
use crate::error::ParameterError;

/// Files and command involved in switching the system timezone.
pub struct SystemTimezone {
    zoneinfo_dir: PathBuf,
    localtime_path: PathBuf,
    timezone_path: PathBuf,
    reconfigure_command: String,
}

impl SystemTimezone {
    pub fn from_settings(system: &SystemSettings) -> Self {
        Self {
            zoneinfo_dir: system.zoneinfo_dir.clone(),
            localtime_path: system.localtime_path.clone(),
            timezone_path: system.timezone_path.clone(),
            reconfigure_command: system.timezone_command.clone(),
        }
    }

    /// Make `name` the system timezone.
    ///
    /// Fails with a command error when no zoneinfo file exists for `name`. Returns
    /// false when a system file could not be written or the reconfigure command
    /// failed; both are logged.
    pub fn apply(&self, name: &str, runner: &dyn CommandRunner) -> Result<bool> {
        let zoneinfo = self.zoneinfo_dir.join(name);
        log_debug!("Checking zoneinfo file: {}", zoneinfo.display());
        if !zoneinfo.exists() {
            return Err(ParameterError::command(format!(
                "No system file found for \"{name}\" timezone"
            ))
            .into());
        }

        match fs::remove_file(&self.localtime_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                log_error!(
                    "Unable to remove {}: {e}. System timezone is not configured!",
                    self.localtime_path.display()
                );
                return Ok(false);
            }
        }

        log_debug!(
            "Writing timezone \"{name}\" in \"{}\"",
            self.timezone_path.display()
        );
        if let Err(e) = fs::write(&self.timezone_path, format!("{name}\n")) {
            log_error!(
                "Unable to write timezone data on \"{}\": {e}. System timezone is not configured!",
                self.timezone_path.display()
            );
            return Ok(false);
        }

        if let Err(e) = std::os::unix::fs::symlink(&zoneinfo, &self.localtime_path) {
            log_error!(
                "Unable to link {} to {}: {e}",
                self.localtime_path.display(),
                zoneinfo.display()
            );
            return Ok(false);
        }

        if self.reconfigure_command.trim().is_empty() {
            return Ok(true);
        }

        log_debug!("Updating system timezone");
        let output = runner.command(&self.reconfigure_command, TIMEZONE_RECONFIGURE_TIMEOUT_SECS)?;
        log_debug!("Timezone update command result: {:?}", output);
        if !output.success() {
            log_error!("Error reconfiguring system timezone: {}", output.stderr.trim());
            return Ok(false);
        }

        Ok(true)
    }
}
