// src/supervisor/mod.rs

//! Multi-workspace fan-out.
//!
//! The supervisor starts one worker process per configured workspace (the same
//! executable in single-directory mode, see [`WorkerSpec::args`]) and owns
//! their lifecycle: it waits for all of them, and on interrupt gives them a
//! grace period to shut down on their own before killing the rest.

pub mod worker;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::context::RunContext;
use crate::errors::{GateError, Result};
use crate::fs::FileSystem;

pub use worker::{WorkerFlags, WorkerSpec};

/// How long workers get to exit after an interrupt before they are killed.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Exit of one worker. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerExit {
    pub workspace: String,
    pub code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorReport {
    /// One entry per worker, in workspace order.
    pub exits: Vec<WorkerExit>,
    pub interrupted: bool,
}

impl SupervisorReport {
    /// 0 when every worker exited 0; otherwise the first failing worker's
    /// code in workspace order (1 for workers without an exit code).
    pub fn exit_code(&self) -> i32 {
        self.exits
            .iter()
            .find_map(|exit| match exit.code {
                Some(0) => None,
                Some(code) => Some(code),
                None => Some(1),
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceSupervisor {
    program: PathBuf,
    workers: Vec<WorkerSpec>,
    grace: Duration,
}

type WorkerResult = (usize, io::Result<ExitStatus>);

impl WorkspaceSupervisor {
    /// Plan one worker per workspace below `ctx`, running `program`.
    ///
    /// Fails with a config error if a workspace directory does not exist.
    pub fn new(
        program: impl Into<PathBuf>,
        fs: &dyn FileSystem,
        ctx: &RunContext,
        workspaces: &[String],
        flags: &WorkerFlags,
    ) -> Result<Self> {
        let mut workers = Vec::with_capacity(workspaces.len());
        for ws in workspaces {
            let child = ctx.child(ws);
            if !fs.is_dir(child.base_dir()) {
                return Err(GateError::ConfigError(format!(
                    "workspace '{ws}' does not exist at {:?}",
                    child.base_dir()
                )));
            }
            workers.push(WorkerSpec::new(ws.clone(), child.base_dir(), flags.clone()));
        }

        Ok(Self {
            program: program.into(),
            workers,
            grace: DEFAULT_SHUTDOWN_GRACE,
        })
    }

    /// Same as [`WorkspaceSupervisor::new`] with the running executable.
    pub fn for_current_exe(
        fs: &dyn FileSystem,
        ctx: &RunContext,
        workspaces: &[String],
        flags: &WorkerFlags,
    ) -> Result<Self> {
        let program = std::env::current_exe()?;
        Self::new(program, fs, ctx, workspaces, flags)
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn workers(&self) -> &[WorkerSpec] {
        &self.workers
    }

    /// Start every worker and wait for all of them, or for `shutdown`.
    pub async fn run<S>(self, shutdown: S) -> Result<SupervisorReport>
    where
        S: Future<Output = ()>,
    {
        let mut set: JoinSet<WorkerResult> = JoinSet::new();

        for (idx, spec) in self.workers.iter().enumerate() {
            let mut cmd = Command::new(&self.program);
            cmd.args(spec.args())
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true);

            // Workers already started are killed when `set` is dropped.
            let mut child = cmd.spawn().map_err(|e| GateError::Spawn {
                command: format!("{} (workspace {})", self.program.display(), spec.workspace()),
                reason: e.to_string(),
            })?;

            info!(workspace = %spec.workspace(), pid = child.id(), "started worker");
            set.spawn(async move { (idx, child.wait().await) });
        }

        let mut codes: Vec<Option<i32>> = vec![None; self.workers.len()];
        let mut interrupted = false;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                joined = set.join_next() => match joined {
                    Some(res) => self.record(res, &mut codes),
                    None => break,
                },
                _ = &mut shutdown => {
                    info!("interrupt received; stopping workers");
                    interrupted = true;
                    break;
                }
            }
        }

        if interrupted {
            let grace = tokio::time::sleep(self.grace);
            tokio::pin!(grace);
            loop {
                tokio::select! {
                    joined = set.join_next() => match joined {
                        Some(res) => self.record(res, &mut codes),
                        None => break,
                    },
                    _ = &mut grace => {
                        warn!(remaining = set.len(), "workers still running after grace period; killing");
                        set.abort_all();
                        while let Some(res) = set.join_next().await {
                            self.record(res, &mut codes);
                        }
                        break;
                    }
                }
            }
        }

        let exits = self
            .workers
            .iter()
            .zip(codes)
            .map(|(spec, code)| WorkerExit {
                workspace: spec.workspace().to_string(),
                code,
            })
            .collect();

        Ok(SupervisorReport { exits, interrupted })
    }

    fn record(&self, res: std::result::Result<WorkerResult, JoinError>, codes: &mut [Option<i32>]) {
        match res {
            Ok((idx, Ok(status))) => {
                let workspace = self.workers[idx].workspace();
                codes[idx] = status.code();
                if status.success() {
                    info!(workspace = %workspace, "worker finished");
                } else {
                    warn!(workspace = %workspace, exit_code = ?status.code(), "worker failed");
                }
            }
            Ok((idx, Err(e))) => {
                warn!(workspace = %self.workers[idx].workspace(), error = %e, "failed to wait for worker");
            }
            // Aborted after the grace period; the child was killed on drop.
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(error = %e, "worker task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::RealFileSystem;
    use std::path::Path;

    fn exit(ws: &str, code: Option<i32>) -> WorkerExit {
        WorkerExit {
            workspace: ws.to_string(),
            code,
        }
    }

    #[test]
    fn report_exit_code_is_first_failure_in_workspace_order() {
        let ok = SupervisorReport {
            exits: vec![exit("a", Some(0)), exit("b", Some(0))],
            interrupted: false,
        };
        assert_eq!(ok.exit_code(), 0);

        let failed = SupervisorReport {
            exits: vec![exit("a", Some(0)), exit("b", Some(4)), exit("c", Some(2))],
            interrupted: false,
        };
        assert_eq!(failed.exit_code(), 4);

        let killed = SupervisorReport {
            exits: vec![exit("a", None), exit("b", Some(0))],
            interrupted: true,
        };
        assert_eq!(killed.exit_code(), 1);
    }

    #[test]
    fn missing_workspace_is_a_config_error() {
        let fs = MockFileSystem::new();
        fs.add_dir("repo/present");
        let ctx = RunContext::root("repo");

        let ok = WorkspaceSupervisor::new(
            "buildgate",
            &fs,
            &ctx,
            &["present".to_string()],
            &WorkerFlags::default(),
        )
        .unwrap();
        assert_eq!(ok.workers().len(), 1);
        assert_eq!(ok.workers()[0].base_dir(), Path::new("repo/present"));

        let err = WorkspaceSupervisor::new(
            "buildgate",
            &fs,
            &ctx,
            &["missing".to_string()],
            &WorkerFlags::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GateError::ConfigError(msg) if msg.contains("missing")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn interrupt_kills_workers_after_grace() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ws")).unwrap();
        // Ignores the worker arguments and never exits on its own.
        let program = dir.path().join("hang.sh");
        std::fs::write(&program, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = RunContext::root(dir.path());
        let supervisor = WorkspaceSupervisor::new(
            &program,
            &RealFileSystem,
            &ctx,
            &["ws".to_string()],
            &WorkerFlags::default(),
        )
        .unwrap()
        .with_grace(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let report = tokio::time::timeout(Duration::from_secs(10), supervisor.run(async {}))
            .await
            .expect("supervisor should stop after the grace period")
            .unwrap();

        assert!(report.interrupted);
        assert_eq!(report.exits, vec![exit("ws", None)]);
        assert_eq!(report.exit_code(), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
