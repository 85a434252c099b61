//! Unix signal handling for the daemon.
//!
//! SIGINT, SIGTERM and SIGHUP all request a graceful stop: a background thread
//! clears the shared running flag and the main loop exits at its next check.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
}

impl SignalState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn describe(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT (Ctrl+C)",
        SIGTERM => "SIGTERM (termination request)",
        SIGHUP => "SIGHUP (terminal disconnected)",
        _ => "unexpected signal",
    }
}

/// Set up signal handling and return the running flag it controls.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::spawn(move || {
        for sig in signals.forever() {
            // The terminal is gone after SIGHUP, so stay quiet
            if sig != SIGHUP {
                log_pipe!();
                log_info!("Received {}, shutting down...", describe(sig));
            }
            running_clone.store(false, Ordering::SeqCst);
        }
    });

    Ok(SignalState { running })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::{Duration, Instant};

    #[test]
    #[serial]
    fn test_sigterm_clears_running_flag() {
        let state = setup_signal_handler().unwrap();
        assert!(state.is_running());

        signal_hook::low_level::raise(SIGTERM).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while state.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!state.is_running());
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(SIGINT), "SIGINT (Ctrl+C)");
        assert_eq!(describe(0), "unexpected signal");
    }
}
