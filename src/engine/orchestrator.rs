// src/engine/orchestrator.rs

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn, Instrument};

use crate::config::ConfigFile;
use crate::context::RunContext;
use crate::engine::decision::{decide, Decision};
use crate::engine::{RunOptions, RunOutcome};
use crate::errors::{GateError, Result};
use crate::exec::{CommandOutcome, CommandRunner};
use crate::fingerprint::Fingerprinter;
use crate::fs::FileSystem;
use crate::state::{HashStore, LockGuard};
use crate::types::Fingerprint;

/// Decides skip/run for one base directory and executes the command.
///
/// Lifecycle of [`RunOrchestrator::run`]:
///
/// 1. take the lock marker, or return `SkippedLocked`
/// 2. fingerprint the watched files and load the last record
/// 3. unless forced, return `SkippedUnchanged` when they are equal
/// 4. run the command and wait for it
/// 5. release the lock; on success persist the fingerprint unless `dry`
///
/// The lock is a [`LockGuard`], so it is also released when any of the steps
/// above fail or return early.
pub struct RunOrchestrator<R: CommandRunner> {
    ctx: RunContext,
    config: Arc<ConfigFile>,
    fs: Arc<dyn FileSystem>,
    fingerprinter: Fingerprinter,
    store: Box<dyn HashStore>,
    runner: R,
}

impl<R: CommandRunner> fmt::Debug for RunOrchestrator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOrchestrator")
            .field("ctx", &self.ctx)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> RunOrchestrator<R> {
    pub fn new(
        ctx: RunContext,
        config: Arc<ConfigFile>,
        fs: Arc<dyn FileSystem>,
        store: Box<dyn HashStore>,
        runner: R,
    ) -> Self {
        let fingerprinter = Fingerprinter::new(Arc::clone(&fs));
        Self {
            ctx,
            config,
            fs,
            fingerprinter,
            store,
            runner,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Fingerprint of the watched files right now.
    pub async fn current_fingerprint(&self) -> Result<Fingerprint> {
        self.fingerprinter
            .compute(&self.ctx, self.config.watch())
            .await
    }

    /// Run `command` if the watched files changed since the last success.
    pub async fn run(&mut self, command: &str, options: RunOptions) -> Result<RunOutcome> {
        let span = self.ctx.span();
        self.run_inner(command, options).instrument(span).await
    }

    async fn run_inner(&mut self, command: &str, options: RunOptions) -> Result<RunOutcome> {
        let lock = match LockGuard::try_acquire(Arc::clone(&self.fs), &self.ctx) {
            Ok(lock) => lock,
            Err(GateError::LockHeld(path)) => {
                info!(lock = ?path, "locked, skipping");
                return Ok(RunOutcome::SkippedLocked);
            }
            Err(e) => return Err(e),
        };

        let current = self.current_fingerprint().await?;
        let last = self.store.load(&self.ctx)?;

        match decide(&last, &current, options.force) {
            Decision::Skip => {
                info!(hash = %current, "no changes, skipping");
                return Ok(RunOutcome::SkippedUnchanged);
            }
            Decision::Run(reason) => {
                info!(hash = %current, last = %last, ?reason, "changes detected");
            }
        }

        info!(cmd = %command, "running command");
        let outcome = self.runner.run(&self.ctx, command).await?;
        lock.release()?;

        match outcome {
            CommandOutcome::Success if options.dry => {
                info!(hash = %current, "run without hash update");
                Ok(RunOutcome::Succeeded {
                    fingerprint: current,
                    persisted: false,
                })
            }
            CommandOutcome::Success => {
                self.store.save(&self.ctx, &current)?;
                info!(hash = %current, "updated hash");
                Ok(RunOutcome::Succeeded {
                    fingerprint: current,
                    persisted: true,
                })
            }
            CommandOutcome::Failed(code) => {
                warn!(cmd = %command, exit_code = code, "command failed; hash not updated");
                Ok(RunOutcome::Failed { code })
            }
        }
    }

    /// Read-only change query: compare without locking or running anything.
    ///
    /// Returns true when the files changed (always true with `force`). With
    /// `update`, the current fingerprint is persisted regardless of the result.
    pub async fn detect_changes(&mut self, update: bool, force: bool) -> Result<bool> {
        let span = self.ctx.span();
        self.detect_inner(update, force).instrument(span).await
    }

    async fn detect_inner(&mut self, update: bool, force: bool) -> Result<bool> {
        let current = self.current_fingerprint().await?;
        let last = self.store.load(&self.ctx)?;
        let changed = decide(&last, &current, force).should_run();
        info!(changed, hash = %current, "change query");

        if update {
            self.store.save(&self.ctx, &current)?;
            info!(hash = %current, "updated hash");
        }
        Ok(changed)
    }
}
