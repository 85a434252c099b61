//! Command-line argument parsing and processing.
//!
//! Arguments are split into flags and positionals first; the first positional
//! selects the subcommand. Negative numbers are positionals, so
//! `set position 40.7 -74.0` parses as expected.

use crate::commands::set::{SetField, parse_set_args};

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the clock service
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        events_json: bool,
        log_file: Option<String>,
    },
    GetCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        fields: Vec<String>,
        json: bool,
    },
    SetCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        field: SetField,
    },
    SunCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        at: Option<String>,
    },
    SyncTimeCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    CallCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        request: String,
    },
    HelpCommand {
        command: Option<String>,
    },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
    /// Show one command's usage after a bad invocation of it
    ShowCommandUsageDueToError { command: String },
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

fn is_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg.len() > 1 && arg.parse::<f64>().is_err()
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut events_json = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut at: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--json" | "-j" => json = true,
                "--events-json" => events_json = true,
                "--config" | "-c" | "--at" | "--log-file" => {
                    match args_vec.get(i + 1).filter(|next| !is_flag(next)) {
                        Some(value) => {
                            let slot = match arg {
                                "--at" => &mut at,
                                "--log-file" => &mut log_file,
                                _ => &mut config_dir,
                            };
                            *slot = Some(value.clone());
                            i += 1;
                        }
                        None => {
                            log_warning!("Missing value for {arg}");
                            unknown_arg_found = true;
                        }
                    }
                }
                flag if is_flag(flag) => {
                    log_warning!("Unknown argument: {flag}");
                    unknown_arg_found = true;
                }
                _ => positionals.push(args_vec[i].clone()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let (command, rest) = match positionals.split_first() {
            Some((command, rest)) => (command.as_str(), rest),
            None => ("run", &[][..]),
        };

        let usage_error = |command: &str| ParsedArgs {
            action: CliAction::ShowCommandUsageDueToError {
                command: command.to_string(),
            },
        };

        let action = match command {
            "run" if rest.is_empty() => CliAction::Run {
                debug_enabled,
                config_dir,
                events_json,
                log_file,
            },
            "get" | "g" => {
                if rest.is_empty() {
                    log_warning!("Missing field. Usage: devparams get <field> [<field>...]");
                    return usage_error(command);
                }
                CliAction::GetCommand {
                    debug_enabled,
                    config_dir,
                    fields: rest.to_vec(),
                    json,
                }
            }
            "set" | "s" => match parse_set_args(rest) {
                Ok(field) => CliAction::SetCommand {
                    debug_enabled,
                    config_dir,
                    field,
                },
                Err(message) => {
                    log_warning!("{message}");
                    return usage_error(command);
                }
            },
            "sun" if rest.is_empty() => CliAction::SunCommand {
                debug_enabled,
                config_dir,
                at,
            },
            "sync-time" if rest.is_empty() => CliAction::SyncTimeCommand {
                debug_enabled,
                config_dir,
            },
            "call" => match rest {
                [request] => CliAction::CallCommand {
                    debug_enabled,
                    config_dir,
                    request: request.clone(),
                },
                _ => {
                    log_warning!("Expected one JSON request. Usage: devparams call '<json>'");
                    return usage_error(command);
                }
            },
            "help" | "h" => CliAction::HelpCommand {
                command: rest.first().cloned(),
            },
            "run" | "sun" | "sync-time" => {
                log_warning!("Unexpected arguments for {command}: {}", rest.join(" "));
                return usage_error(command);
            }
            unknown => {
                log_warning!("Unknown command: {}", unknown);
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("devparams [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-j, --json             JSON output for 'get'");
    log_indented!("    --at <time>        Day for 'sun' (YYYY-MM-DD HH:MM:SS, UTC)");
    log_indented!("    --events-json      Write events as JSON lines when running");
    log_indented!("    --log-file <path>  Write the service log to a file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Run the clock service (default)");
    log_indented!("get, g <field>...      Read parameter(s)");
    log_indented!("set, s <field> <value> Update position or device name");
    log_indented!("sun                    Show sunrise and sunset");
    log_indented!("sync-time              Synchronize the clock with NTP");
    log_indented!("call '<json>'          Run a host command request");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["devparams"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                events_json: false,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_run_with_flags() {
        let parsed = ParsedArgs::parse(vec![
            "devparams",
            "-d",
            "run",
            "--config",
            "/tmp/params",
            "--events-json",
            "--log-file",
            "/tmp/devparams.log",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/params".to_string()),
                events_json: true,
                log_file: Some("/tmp/devparams.log".to_string()),
            }
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["devparams", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
        let parsed = ParsedArgs::parse(vec!["devparams", "get", "all", "-h"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["devparams", "--debug", "--invalid"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_missing_config_value() {
        let parsed = ParsedArgs::parse(vec!["devparams", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_get() {
        let parsed = ParsedArgs::parse(vec!["devparams", "get", "--json", "latitude", "timezone"]);
        assert_eq!(
            parsed.action,
            CliAction::GetCommand {
                debug_enabled: false,
                config_dir: None,
                fields: vec!["latitude".to_string(), "timezone".to_string()],
                json: true,
            }
        );

        let parsed = ParsedArgs::parse(vec!["devparams", "g"]);
        assert_eq!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError {
                command: "g".to_string()
            }
        );
    }

    #[test]
    fn test_parse_set_position_with_negative_longitude() {
        let parsed = ParsedArgs::parse(vec!["devparams", "set", "position", "40.7128", "-74.006"]);
        assert_eq!(
            parsed.action,
            CliAction::SetCommand {
                debug_enabled: false,
                config_dir: None,
                field: SetField::Position {
                    latitude: 40.7128,
                    longitude: -74.006
                },
            }
        );
    }

    #[test]
    fn test_parse_set_hostname() {
        let parsed = ParsedArgs::parse(vec!["devparams", "s", "hostname", "kitchen", "-d"]);
        assert_eq!(
            parsed.action,
            CliAction::SetCommand {
                debug_enabled: true,
                config_dir: None,
                field: SetField::Hostname("kitchen".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_sun_at() {
        let parsed = ParsedArgs::parse(vec!["devparams", "sun", "--at", "2024-06-21 12:00:00"]);
        assert_eq!(
            parsed.action,
            CliAction::SunCommand {
                debug_enabled: false,
                config_dir: None,
                at: Some("2024-06-21 12:00:00".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_call() {
        let parsed = ParsedArgs::parse(vec!["devparams", "call", r#"{"command":"get_sun"}"#]);
        assert_eq!(
            parsed.action,
            CliAction::CallCommand {
                debug_enabled: false,
                config_dir: None,
                request: r#"{"command":"get_sun"}"#.to_string(),
            }
        );

        let parsed = ParsedArgs::parse(vec!["devparams", "call"]);
        assert!(matches!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError { .. }
        ));
    }

    #[test]
    fn test_parse_help_subcommand() {
        let parsed = ParsedArgs::parse(vec!["devparams", "help", "set"]);
        assert_eq!(
            parsed.action,
            CliAction::HelpCommand {
                command: Some("set".to_string())
            }
        );
    }

    #[test]
    fn test_parse_extra_arguments() {
        let parsed = ParsedArgs::parse(vec!["devparams", "sync-time", "now"]);
        assert_eq!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError {
                command: "sync-time".to_string()
            }
        );
        let parsed = ParsedArgs::parse(vec!["devparams", "reboot"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
