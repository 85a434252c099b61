//! Device name handling.
//!
//! The device name is the system hostname. It is validated against RFC 1123 rules
//! and written to the hostname file, with the Debian loopback entry of the hosts
//! file kept in sync.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::constants::*;
use crate::error::ParameterError;

static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(HOSTNAME_PATTERN).expect("hostname pattern is a valid regex"));

/// A validated device name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceName {
    pub name: String,
}

impl std::fmt::Display for DeviceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validate a candidate device name.
pub fn validate_hostname(name: &str) -> Result<DeviceName, ParameterError> {
    if name.is_empty() {
        return Err(ParameterError::missing("hostname"));
    }
    let too_long = name.len() > MAXIMUM_HOSTNAME_LENGTH
        || name
            .split('.')
            .any(|label| label.len() > MAXIMUM_HOSTNAME_LABEL_LENGTH);
    if too_long || !HOSTNAME_REGEX.is_match(name) {
        return Err(ParameterError::invalid("Hostname is not valid"));
    }
    Ok(DeviceName {
        name: name.to_string(),
    })
}

/// Reads and writes the hostname and hosts files.
pub struct HostnameFiles {
    hostname_path: PathBuf,
    hosts_path: PathBuf,
}

impl HostnameFiles {
    pub fn new(hostname_path: PathBuf, hosts_path: PathBuf) -> Self {
        Self {
            hostname_path,
            hosts_path,
        }
    }

    /// Current hostname, `None` if the file is missing or empty.
    pub fn get_hostname(&self) -> Option<String> {
        fs::read_to_string(&self.hostname_path)
            .ok()
            .map(|content| content.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Write `name` to the hostname file and update the hosts loopback entry.
    ///
    /// Returns false when the hostname file could not be written. A hosts file
    /// that cannot be updated is only logged.
    pub fn set_hostname(&self, name: &DeviceName) -> Result<bool> {
        let previous = self.get_hostname();

        if let Err(e) = fs::write(&self.hostname_path, format!("{}\n", name.name)) {
            log_error!(
                "Unable to write hostname to {}: {e}",
                self.hostname_path.display()
            );
            return Ok(false);
        }

        if let Err(e) = self.update_hosts(previous.as_deref(), &name.name) {
            log_warning!("Unable to update {}: {e:#}", self.hosts_path.display());
        }

        Ok(true)
    }

    fn update_hosts(&self, previous: Option<&str>, name: &str) -> Result<()> {
        let content = match fs::read_to_string(&self.hosts_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.hosts_path.display()));
            }
        };

        let updated = rewrite_hosts(&content, previous, name);
        fs::write(&self.hosts_path, updated)
            .with_context(|| format!("Failed to write {}", self.hosts_path.display()))
    }
}

/// Point the loopback entry at `name`, adding it if missing.
///
/// Other occurrences of the previous hostname on any line are replaced as well.
fn rewrite_hosts(content: &str, previous: Option<&str>, name: &str) -> String {
    let mut found_loopback = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            let mut fields = line.split_whitespace();
            if fields.next() == Some(HOSTS_LOOPBACK_ADDRESS) {
                found_loopback = true;
                return format!("{HOSTS_LOOPBACK_ADDRESS}\t{name}");
            }
            match previous {
                Some(old)
                    if !line.trim_start().starts_with('#')
                        && line.split_whitespace().any(|field| field == old) =>
                {
                    line.split_whitespace()
                        .map(|field| if field == old { name } else { field })
                        .collect::<Vec<_>>()
                        .join("\t")
                }
                _ => line.to_string(),
            }
        })
        .collect();

    if !found_loopback {
        lines.push(format!("{HOSTS_LOOPBACK_ADDRESS}\t{name}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
