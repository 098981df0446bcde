// src/config/loader.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GateError, Result};
use crate::fs::FileSystem;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs JSON deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !fs.exists(path) {
        return Err(GateError::ConfigMissing(path.to_path_buf()));
    }

    let contents = fs
        .read_to_string(path)
        .map_err(|e| GateError::ConfigMalformed {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

    serde_json::from_str(&contents).map_err(|e| GateError::ConfigMalformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load a configuration file from path and run validation.
///
/// - Reads JSON.
/// - Applies defaults (handled by `serde`).
/// - Compiles watch patterns and checks workspace paths.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(fs, &path)?;
    ConfigFile::try_from(raw_config)
}
