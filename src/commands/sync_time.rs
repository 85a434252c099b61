//! Sync-time command: one NTP synchronization of the system clock.

use anyhow::Result;

use crate::events::LogSink;

pub fn handle_sync_time_command() -> Result<()> {
    log_version!();
    let mut service = super::open_service(Box::new(LogSink))?;

    log_block_start!("Synchronizing time with NTP server...");
    if service.sync_time()? {
        log_decorated!("Time synchronized");
        log_end!();
        Ok(())
    } else {
        anyhow::bail!("Time synchronization failed")
    }
}

pub fn display_help() {
    log_version!();
    log_block_start!("sync-time - Synchronize the system clock");
    log_block_start!("Usage: devparams sync-time");
    log_indented!("Runs the configured NTP command (up to one minute).");
    log_end!();
}
