//! Help command: general help or detailed help for one command.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "get" | "g" => log_block_start!("Usage: devparams get [OPTIONS] <field> [<field>...]"),
        "set" | "s" => log_block_start!("Usage: devparams set <position|hostname> <value>..."),
        "sun" => log_block_start!("Usage: devparams sun [--at \"YYYY-MM-DD HH:MM:SS\"]"),
        "call" => log_block_start!("Usage: devparams call '<json>'"),
        "sync-time" => log_block_start!("Usage: devparams sync-time"),
        _ => log_block_start!("Usage: devparams [OPTIONS] [COMMAND]"),
    }
}

/// Run the help command
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("get") | Some("g") => super::get::display_help(),
        Some("set") | Some("s") => super::set::display_help(),
        Some("sun") => super::sun::display_help(),
        Some("call") => super::call::display_help(),
        Some("sync-time") => super::sync_time::display_help(),
        Some("run") => display_run_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("run                     Run the clock service (default)");
    log_indented!("get, g <field>          Read parameter(s)");
    log_indented!("set, s <field> <value>  Update the position or the device name");
    log_indented!("sun                     Show today's sunrise and sunset");
    log_indented!("sync-time               Synchronize the clock with NTP");
    log_indented!("call '<json>'           Run a host command request");
    log_indented!("help, h [COMMAND]       Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'devparams help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'devparams --help' to see all options and general usage.");
    log_end!();
}

fn display_run_help() {
    log_version!();
    log_block_start!("run - Run the clock service");
    log_block_start!("Usage: devparams [run] [OPTIONS]");
    log_indented!("Sends a time event every minute, sunrise and sunset events,");
    log_indented!("and keeps retrying NTP when the clock looks wrong after a reboot.");
    log_block_start!("Options:");
    log_indented!("--events-json        Write events as JSON lines on stdout");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: devparams help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("devparams help");
    log_indented!("devparams help set");
    log_end!();
}
