// src/errors.rs

//! Crate-wide error type.
//!
//! Internal helpers are free to use `anyhow::Context`; anything that crosses a
//! module boundary is converted into a [`GateError`] so the entry point can map
//! it to a process exit status.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("config not found at {0:?}; run `buildgate init` first")]
    ConfigMissing(PathBuf),

    #[error("malformed config {path:?}: {reason}")]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("cannot read watched file {path:?}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("command `{command}` failed with exit code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("lock marker present at {0:?}; another run is in progress")]
    LockHeld(PathBuf),

    #[error("failed to start command `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GateError {
    /// Process exit status for this error.
    ///
    /// A failed build command propagates its own exit code; everything else
    /// exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            GateError::CommandFailed { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GateError>;
