//! Structured logging with the box-drawing output style.
//!
//! Every line goes through [`write_output`], which either prints to stdout (with
//! colors) or forwards to a background file writer thread (colors stripped) once
//! [`Log::start_file_logging`] has been called.
//!
//! ## Conventions
//!
//! - `log_version!` opens the output with `┏ devparams vX.Y.Z ━━╸`.
//! - `log_block_start!` starts a new conceptual block (`┃` spacer then `┣ message`).
//! - `log_decorated!` continues a block (`┣ message`).
//! - `log_indented!` is for details under a block entry (`┃   message`).
//! - `log_pipe!` inserts a spacer line, typically before a semantic log line.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!` carry a
//!   colored `[LEVEL]` tag.
//! - `log_end!` closes the output with `╹`.
//!
//! `log_debug!` lines are only printed when debug output was enabled with
//! [`Log::set_debug`].

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

// Routes output to a file when file logging is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Runtime switches for the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the wall clock time (used by the daemon).
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Start routing all output to `file_path`.
    ///
    /// The returned guard flushes and joins the writer thread when dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Line prefix used by every macro. Empty unless timestamps are enabled.
    pub fn get_timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that ensures a clean shutdown of the writer thread.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Write an already formatted line. Public for macro access.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Format and write one line built from `$layout`, which receives the prefix and
/// the message. Internal building block of the public macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($layout:expr, $($arg:tt)+) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($($arg)+);
            let layout: fn(&str, &str) -> String = $layout;
            $crate::logger::write_output(&layout(&prefix, &message));
        }
    }};
}

/// Log a message that continues the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣ {m}\n"), $($arg)+)
    };
}

/// Log a detail line under the current block entry.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┃   {m}\n"), $($arg)+)
    };
}

/// Log a blank spacer line.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::__log_line!(|p, _| format!("{p}┃\n"), "")
    };
}

/// Start a new block of related messages.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┃\n{p}┣ {m}\n"), $($arg)+)
    };
}

/// Log the application header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!(
            |p, m| format!("{p}┏ devparams v{m} ━━╸\n"),
            "{}",
            env!("CARGO_PKG_VERSION")
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::__log_line!(|p, _| format!("{p}╹\n"), "")
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[32mINFO\x1b[0m] {m}\n"), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[33mWARNING\x1b[0m] {m}\n"), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[31mERROR\x1b[0m] {m}\n"), $($arg)+)
    };
}

/// Log an error that terminates the current flow (`┗[ERROR]`).
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┃\n{p}┗[\x1b[31mERROR\x1b[0m] {m}\n"), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[31mCRITICAL\x1b[0m] {m}\n"), $($arg)+)
    };
}

/// Log a debug message. Silent unless debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        if $crate::logger::Log::is_debug() {
            $crate::__log_line!(|p, m| format!("{p}┣[\x1b[32mDEBUG\x1b[0m] {m}\n"), $($arg)+)
        }
    };
}
