//! Shell command execution with a timeout.

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of a shell command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandOutput {
    /// Exit code, `-1` when killed or terminated by a signal
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
    /// The command hit its timeout and was killed
    pub killed: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.returncode == 0 && !self.killed
    }
}

/// Runs shell commands. Mocked in tests.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send {
    fn command(&self, command: &str, timeout_secs: f64) -> Result<CommandOutput>;
}

/// Runs commands through `sh -c`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Option<i32>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().context("Failed to wait for command")? {
            return Ok(Some(status.code().unwrap_or(-1)));
        }
        if started.elapsed() >= timeout {
            // The shell leads its own group; killing the group also stops the
            // children still holding the output pipes
            if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
                log_debug!("Failed to kill process group: {e}");
                let _ = child.kill();
            }
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl CommandRunner for Console {
    fn command(&self, command: &str, timeout_secs: f64) -> Result<CommandOutput> {
        log_debug!("Running command: {command}");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .with_context(|| format!("Failed to spawn command: {command}"))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let timeout = Duration::from_secs_f64(timeout_secs.max(0.0));
        let code = wait_with_timeout(&mut child, timeout)?;

        let output = CommandOutput {
            returncode: code.unwrap_or(-1),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            killed: code.is_none(),
        };

        if output.killed {
            log_warning!("Command timed out after {timeout_secs}s: {command}");
        }

        Ok(output)
    }
}

/// Runner that records commands instead of running them and answers every call
/// with the same exit code.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    calls: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    returncode: i32,
}

#[cfg(any(test, feature = "testing-support"))]
impl RecordingRunner {
    pub fn new(returncode: i32) -> Self {
        Self {
            returncode,
            ..Self::default()
        }
    }

    /// Commands received so far. Clones share the same record.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl CommandRunner for RecordingRunner {
    fn command(&self, command: &str, _timeout_secs: f64) -> Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.to_string());
        }
        Ok(CommandOutput {
            returncode: self.returncode,
            ..CommandOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_runner() {
        let runner = RecordingRunner::new(2);
        let handle = runner.clone();
        let output = runner.command("ntpdate", 1.0).unwrap();
        assert_eq!(output.returncode, 2);
        assert_eq!(handle.calls(), vec!["ntpdate".to_string()]);
    }

    #[test]
    fn test_command_captures_output() {
        let output = Console.command("echo hello; echo oops >&2", 5.0).unwrap();
        assert_eq!(output.returncode, 0);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
        assert!(output.success());
    }

    #[test]
    fn test_command_exit_code() {
        let output = Console.command("exit 3", 5.0).unwrap();
        assert_eq!(output.returncode, 3);
        assert!(!output.success());
    }

    #[test]
    fn test_command_timeout_kills() {
        let started = Instant::now();
        let output = Console.command("exec sleep 5", 0.2).unwrap();
        assert!(output.killed);
        assert_eq!(output.returncode, -1);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_command_timeout_kills_child_processes() {
        let started = Instant::now();
        let output = Console.command("sleep 4; echo done", 0.5).unwrap();
        assert!(output.killed);
        assert!(!output.success());
        assert_eq!(output.stdout, "");
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
