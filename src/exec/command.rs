// src/exec/command.rs

//! Shell-backed command runner.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::context::RunContext;
use crate::errors::{GateError, Result};
use crate::exec::backend::{CommandOutcome, CommandRunner};

/// Runs the command through the platform shell (`sh -c` / `cmd /C`) with
/// inherited stdin, stdout and stderr.
///
/// Dropping the returned future kills the child.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run<'a>(
        &'a self,
        ctx: &'a RunContext,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + 'a>> {
        Box::pin(async move {
            info!(cmd = %command, cwd = ?ctx.base_dir(), "starting command");

            let mut cmd = shell_command(command);
            cmd.current_dir(ctx.base_dir())
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true);

            let mut child = cmd.spawn().map_err(|e| GateError::Spawn {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

            let status = child.wait().await?;
            let code = status.code().unwrap_or(-1);

            info!(
                cmd = %command,
                exit_code = code,
                success = status.success(),
                "command exited"
            );

            Ok(if status.success() {
                CommandOutcome::Success
            } else {
                CommandOutcome::Failed(code)
            })
        })
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_in_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::root(dir.path());

        let outcome = ShellCommandRunner::new()
            .run(&ctx, "echo built > out.txt")
            .await
            .unwrap();

        assert_eq!(outcome, CommandOutcome::Success);
        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out.trim(), "built");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_with_code() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::root(dir.path());

        let outcome = ShellCommandRunner::new().run(&ctx, "exit 7").await.unwrap();
        assert_eq!(outcome, CommandOutcome::Failed(7));
    }

    #[tokio::test]
    async fn missing_working_directory_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::root(dir.path().join("does-not-exist"));

        let err = ShellCommandRunner::new().run(&ctx, "true").await.unwrap_err();
        assert!(matches!(err, GateError::Spawn { .. }));
    }
}
