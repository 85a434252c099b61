//! Settings store seam.
//!
//! The service reads and writes its settings through [`SettingsStore`] so it can
//! run against the TOML file or a plain in-memory value.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{Settings, loading};

pub trait SettingsStore: Send {
    fn load(&self) -> Result<Settings>;
    fn save(&mut self, settings: &Settings) -> Result<()>;
}

/// Settings persisted in a TOML file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location (or the `--config` override).
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(loading::get_config_path()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            loading::save_to_path(&Settings::default(), &self.path)?;
        }
        loading::load_from_path(&self.path)
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        loading::save_to_path(settings, &self.path)
    }
}

/// Settings kept in memory. Clones share the same value, so a test can keep a
/// handle and inspect what the service saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Settings>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(settings)),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail, to exercise error paths.
    pub fn failing(settings: Settings) -> Self {
        Self {
            fail_saves: true,
            ..Self::new(settings)
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.snapshot())
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        if self.fail_saves {
            anyhow::bail!("settings store is read-only");
        }
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("settings store lock poisoned"))?;
        *guard = settings.clone();
        Ok(())
    }
}
