// src/state/lock.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::errors::{GateError, Result};
use crate::fs::FileSystem;

/// Advisory lock marker for one base directory.
///
/// Holding a `LockGuard` means this process created `<base>/.buildgate-lock`.
/// The marker is removed when the guard is released or dropped, so every exit
/// path of the guarded section lets go of it. Other processes only look at the
/// marker's presence; its content (epoch millis) is informational.
#[derive(Debug)]
pub struct LockGuard {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Create the marker, or fail with [`GateError::LockHeld`] when it exists.
    pub fn try_acquire(fs: Arc<dyn FileSystem>, ctx: &RunContext) -> Result<Self> {
        let path = ctx.lock_path();
        let stamp = epoch_millis().to_string();

        if !fs.create_new(&path, stamp.as_bytes())? {
            return Err(GateError::LockHeld(path));
        }

        debug!(path = ?path, "acquired lock");
        Ok(Self {
            fs,
            path,
            released: false,
        })
    }

    /// Remove the marker now, reporting any failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.fs.remove_file(&self.path)?;
        debug!(path = ?self.path, "released lock");
        Ok(())
    }

    /// Whether a marker currently exists for this base directory.
    pub fn is_held(fs: &dyn FileSystem, ctx: &RunContext) -> bool {
        fs.exists(&ctx.lock_path())
    }

    /// Remove the marker regardless of who created it.
    ///
    /// Returns true if a marker was present.
    pub fn clear(fs: &dyn FileSystem, ctx: &RunContext) -> Result<bool> {
        let path = ctx.lock_path();
        if !fs.exists(&path) {
            return Ok(false);
        }
        fs.remove_file(&path)?;
        info!(path = ?path, "cleared lock marker");
        Ok(true)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.fs.remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "released lock on drop"),
            Err(e) => warn!(path = ?self.path, error = %e, "failed to remove lock marker"),
        }
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
