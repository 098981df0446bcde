// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The orchestrator talks to a `CommandRunner` instead of spawning processes
//! itself. Production code uses [`ShellCommandRunner`](super::ShellCommandRunner);
//! tests provide a fake that records commands and returns a scripted outcome.

use std::future::Future;
use std::pin::Pin;

use crate::context::RunContext;
use crate::errors::Result;

/// How the external command terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit. `-1` when the process was terminated by a signal.
    Failed(i32),
}

/// Trait abstracting how the build command is executed.
pub trait CommandRunner: Send + Sync {
    /// Run `command` with the context's base directory as working directory
    /// and wait for it to terminate.
    ///
    /// An `Err` means the command could not be run at all (e.g. spawn
    /// failure); a non-zero exit is an `Ok(CommandOutcome::Failed(_))`.
    fn run<'a>(
        &'a self,
        ctx: &'a RunContext,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + 'a>>;
}
