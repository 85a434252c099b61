//! Lock file management for single-instance enforcement.
//!
//! The daemon holds an exclusive `fs2` lock on `devparams.lock` in the runtime
//! directory. The file records the owner's PID and config directory so a second
//! start can tell the user which process is running.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config;
use crate::constants::LOCK_FILE_NAME;

/// Held lock. Dropping it releases the lock; [`InstanceLock::release`] also
/// removes the file.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) -> Result<()> {
        FileExt::unlock(&self.file).context("Failed to release lock")?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// Lock file location: `$XDG_RUNTIME_DIR/devparams.lock`, or `/tmp` without a
/// runtime directory.
pub fn lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Try to take the lock at `path`.
///
/// Returns `Ok(None)` when another process holds it.
pub fn acquire_lock_at(path: &Path) -> Result<Option<InstanceLock>> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    match config::get_custom_config_dir() {
        Some(dir) => writeln!(file, "{}", dir.display())?,
        None => writeln!(file)?,
    }
    file.flush()?;

    Ok(Some(InstanceLock {
        file,
        path: path.to_path_buf(),
    }))
}

/// PID recorded in a lock file, if readable.
pub fn read_lock_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Take the daemon lock, reporting the running instance when it is held.
pub fn acquire_lock() -> Result<Option<InstanceLock>> {
    let path = lock_path();
    let lock = acquire_lock_at(&path)?;
    if lock.is_none() {
        log_pipe!();
        match read_lock_pid(&path) {
            Some(pid) => log_error!("devparams is already running (PID: {pid})"),
            None => log_error!("devparams is already running"),
        }
        log_block_start!("Cannot start - another devparams instance is running");
        log_end!();
    }
    Ok(lock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_lock_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let first = acquire_lock_at(&path).unwrap().expect("first lock");
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
        assert!(acquire_lock_at(&path).unwrap().is_none());

        first.release().unwrap();
        assert!(!path.exists());
        let again = acquire_lock_at(&path).unwrap();
        assert!(again.is_some());
    }

    #[test]
    fn test_read_lock_pid_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.lock");
        std::fs::write(&path, "not a pid\n").unwrap();
        assert_eq!(read_lock_pid(&path), None);
        assert_eq!(read_lock_pid(&dir.path().join("missing")), None);
    }
}
