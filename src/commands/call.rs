//! Call command: run one JSON request through the host command surface.
//!
//! Prints the JSON response on stdout and any events as JSON lines on stderr.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::events::JsonLinesSink;

/// Handle `devparams call '<json>'`. Returns whether the command succeeded.
pub fn handle_call_command(request: &str) -> Result<bool> {
    let request: Value = serde_json::from_str(request).context("Request is not valid JSON")?;
    let mut service = super::open_service(Box::new(JsonLinesSink::new(std::io::stderr())))?;

    let response = super::respond(&mut service, &request);
    println!("{}", serde_json::to_string(&response)?);
    Ok(response.get("error").is_none())
}

pub fn display_help() {
    log_version!();
    log_block_start!("call - Run a host command");
    log_block_start!("Usage: devparams call '<json>'");
    log_block_start!("Request format:");
    log_indented!("{{\"command\": \"<name>\", \"params\": {{...}}}}");
    log_block_start!("Commands:");
    for name in super::COMMAND_NAMES {
        log_indented!("{name}");
    }
    log_block_start!("Examples:");
    log_indented!("devparams call '{{\"command\": \"get_sun\"}}'");
    log_indented!(
        "devparams call '{{\"command\": \"set_position\", \"params\": {{\"latitude\": 48.85, \"longitude\": 2.35}}}}'"
    );
    log_end!();
}
