// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `CommandRunner` trait the orchestrator talks to.
//! - [`command`] contains `ShellCommandRunner`, which runs the build command
//!   through `tokio::process::Command` with inherited stdio.

pub mod backend;
pub mod command;

pub use backend::{CommandOutcome, CommandRunner};
pub use command::ShellCommandRunner;
