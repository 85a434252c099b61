//! Main application entry point.
//!
//! Parses the command line, applies the global options (debug output, config
//! directory) and hands over to the selected command.

use devparams::args::{self, CliAction, ParsedArgs};
use devparams::commands;
use devparams::config;
use devparams::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use devparams::daemon;
use devparams::logger::Log;
use devparams::{log_end, log_error_exit, log_pipe};

fn apply_global_options(debug_enabled: bool, config_dir: Option<String>) -> anyhow::Result<()> {
    Log::set_debug(debug_enabled);
    config::set_config_dir(config_dir)
}

fn run(action: CliAction) -> anyhow::Result<i32> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
        }
        CliAction::ShowHelp => {
            args::display_help();
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            return Ok(EXIT_FAILURE);
        }
        CliAction::ShowCommandUsageDueToError { command } => {
            commands::help::show_command_usage(&command);
            log_end!();
            return Ok(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => {
            commands::help::run_help_command(command.as_deref())?;
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            events_json,
            log_file,
        } => {
            apply_global_options(debug_enabled, config_dir)?;
            Log::set_timestamps(true);
            let _log_guard = log_file.map(Log::start_file_logging).transpose()?;
            if !daemon::run_daemon(events_json)? {
                return Ok(EXIT_FAILURE);
            }
        }
        CliAction::GetCommand {
            debug_enabled,
            config_dir,
            fields,
            json,
        } => {
            apply_global_options(debug_enabled, config_dir)?;
            // Keep stdout clean for the values
            Log::set_enabled(debug_enabled);
            commands::get::handle_get_command(&fields, json)?;
        }
        CliAction::SetCommand {
            debug_enabled,
            config_dir,
            field,
        } => {
            apply_global_options(debug_enabled, config_dir)?;
            commands::set::handle_set_command(&field)?;
        }
        CliAction::SunCommand {
            debug_enabled,
            config_dir,
            at,
        } => {
            apply_global_options(debug_enabled, config_dir)?;
            commands::sun::handle_sun_command(at.as_deref())?;
        }
        CliAction::SyncTimeCommand {
            debug_enabled,
            config_dir,
        } => {
            apply_global_options(debug_enabled, config_dir)?;
            commands::sync_time::handle_sync_time_command()?;
        }
        CliAction::CallCommand {
            debug_enabled,
            config_dir,
            request,
        } => {
            apply_global_options(debug_enabled, config_dir)?;
            Log::set_enabled(debug_enabled);
            if !commands::call::handle_call_command(&request)? {
                return Ok(EXIT_FAILURE);
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

fn main() {
    let parsed = ParsedArgs::from_env();
    let code = match run(parsed.action) {
        Ok(code) => code,
        Err(e) => {
            Log::set_enabled(true);
            log_pipe!();
            log_error_exit!("{e:#}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
