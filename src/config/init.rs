// src/config/init.rs

//! `buildgate init` scaffolding.

use tracing::info;

use crate::config::model::RawConfigFile;
use crate::context::RunContext;
use crate::errors::{GateError, Result};
use crate::fs::FileSystem;
use crate::state::HashStore;
use crate::types::{HASH_FILE_NAME, LOCK_FILE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    /// A config already existed; nothing was written.
    AlreadyExists,
}

/// Write the default config and a "never built" hash record.
///
/// An existing config is never overwritten, and in that case the hash record
/// is left alone too.
pub fn init_config(
    fs: &dyn FileSystem,
    store: &mut dyn HashStore,
    ctx: &RunContext,
) -> Result<InitOutcome> {
    let config_path = ctx.config_path();
    if fs.exists(&config_path) {
        info!(path = ?config_path, "config already exists");
        return Ok(InitOutcome::AlreadyExists);
    }

    let json = serde_json::to_string_pretty(&RawConfigFile::scaffold())
        .map_err(|e| GateError::Other(e.into()))?;
    fs.write(&config_path, json.as_bytes())?;
    store.reset(ctx)?;

    info!(path = ?config_path, "generated config");
    info!(
        "add the state files to .gitignore:\n\n    echo \"{HASH_FILE_NAME}\" >> .gitignore\n    echo \"{LOCK_FILE_NAME}\" >> .gitignore\n"
    );
    Ok(InitOutcome::Created)
}
