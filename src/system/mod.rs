//! System integration: shell commands, timezone files and NTP time sync.

pub mod console;
pub mod timezone;

use anyhow::Result;

use crate::constants::NTP_SYNC_TIMEOUT_SECS;
#[cfg(any(test, feature = "testing-support"))]
pub use console::RecordingRunner;
pub use console::{CommandOutput, CommandRunner, Console};
pub use timezone::SystemTimezone;

/// Synchronize the system clock with an NTP server.
///
/// May take up to a minute. Returns true when the sync command succeeded.
pub fn sync_time(runner: &dyn CommandRunner, ntp_command: &str) -> Result<bool> {
    let output = runner.command(ntp_command, NTP_SYNC_TIMEOUT_SECS)?;
    if !output.success() {
        log_debug!(
            "Time sync failed (code {}): {}",
            output.returncode,
            output.stderr.trim()
        );
    }
    Ok(output.success())
}
