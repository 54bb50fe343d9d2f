use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Read,
    Write,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Read => f.write_str("READ"),
            Mode::Write => f.write_str("WRITE"),
        }
    }
}

/// Process-wide lock over the live configuration. Readers share it; a writer excludes every
/// other configuration access, jobs or otherwise.
#[derive(Debug, Clone, Default)]
pub struct ConfigLock(Arc<RwLock<()>>);

#[derive(Debug)]
enum Held {
    Read(OwnedRwLockReadGuard<()>),
    Write(OwnedRwLockWriteGuard<()>),
}

/// Releases the lock when dropped.
#[derive(Debug)]
pub struct ConfigLockGuard {
    mode: Mode,
    _held: Held,
}

impl ConfigLockGuard {
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl Drop for ConfigLockGuard {
    fn drop(&mut self) {
        tracing::debug!(mode = %self.mode, "released configuration lock");
    }
}

impl ConfigLock {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn lock(&self, mode: Mode) -> ConfigLockGuard {
        let held = match mode {
            Mode::Read => Held::Read(self.0.clone().read_owned().await),
            Mode::Write => Held::Write(self.0.clone().write_owned().await),
        };
        tracing::debug!(%mode, "acquired configuration lock");
        ConfigLockGuard { mode, _held: held }
    }

    pub fn try_lock(&self, mode: Mode) -> Option<ConfigLockGuard> {
        let held = match mode {
            Mode::Read => Held::Read(self.0.clone().try_read_owned().ok()?),
            Mode::Write => Held::Write(self.0.clone().try_write_owned().ok()?),
        };
        Some(ConfigLockGuard { mode, _held: held })
    }
}
