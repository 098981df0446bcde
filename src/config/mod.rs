// src/config/mod.rs

//! Configuration loading and validation for buildgate.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate patterns and workspace paths (`validate.rs`).
//! - Scaffold a fresh config for `buildgate init` (`init.rs`).

pub mod init;
pub mod loader;
pub mod model;
pub mod validate;

pub use init::{init_config, InitOutcome};
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile};
