// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fingerprint;
pub mod fs;
pub mod logging;
pub mod state;
pub mod supervisor;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cli::{ChangedArgs, CliArgs, Command, ExecArgs};
use crate::config::{init_config, load_and_validate, ConfigFile};
use crate::context::RunContext;
use crate::engine::{RunOptions, RunOrchestrator, RunOutcome};
use crate::errors::{GateError, Result};
use crate::exec::ShellCommandRunner;
use crate::fs::{FileSystem, RealFileSystem};
use crate::state::FileHashStore;
use crate::supervisor::{WorkerFlags, WorkspaceSupervisor};
use crate::watch::{watch_directory, DEFAULT_DEBOUNCE};

/// Exit status used when a single run is interrupted with Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit status on success. Errors map to a status through
/// [`GateError::exit_code`].
pub async fn run(args: CliArgs) -> Result<i32> {
    let base = resolve_base_dir(args.base.as_deref())?;
    let ctx = RunContext::new(base, args.label.clone().unwrap_or_else(|| ".".to_string()));
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match args.resolved_command() {
        Command::Init => {
            let mut store = FileHashStore::new(Arc::clone(&fs));
            init_config(fs.as_ref(), &mut store, &ctx)?;
            Ok(0)
        }
        Command::Changed(changed) => run_changed(ctx, fs, changed).await,
        Command::Exec(exec) => {
            let config = Arc::new(load_and_validate(fs.as_ref(), ctx.config_path())?);
            if config.has_workspaces() && !args.worker {
                run_workspaces(fs.as_ref(), &ctx, &config, exec, &args).await
            } else {
                run_exec(ctx, config, fs, exec).await
            }
        }
    }
}

async fn run_changed(ctx: RunContext, fs: Arc<dyn FileSystem>, args: ChangedArgs) -> Result<i32> {
    let config = Arc::new(load_and_validate(fs.as_ref(), ctx.config_path())?);
    let mut orchestrator = build_orchestrator(ctx, config, fs);

    let changed = orchestrator.detect_changes(args.update, args.force).await?;
    // 0 = changed so that `buildgate changed && build` only builds on change.
    Ok(if changed { 0 } else { 1 })
}

async fn run_exec(
    ctx: RunContext,
    config: Arc<ConfigFile>,
    fs: Arc<dyn FileSystem>,
    args: ExecArgs,
) -> Result<i32> {
    let command = config
        .resolve_command(args.command.as_deref())
        .map(str::to_string)
        .ok_or_else(|| {
            GateError::ConfigError(format!(
                "no command configured in {:?} and none given on the command line",
                ctx.config_path()
            ))
        })?;

    let options = RunOptions {
        force: args.force,
        dry: args.dry,
    };
    let mut orchestrator = build_orchestrator(ctx, config, fs);

    if args.watch {
        let window = args
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE);
        watch_directory(orchestrator, command, options, window, shutdown_signal()).await?;
        return Ok(0);
    }

    let span = orchestrator.context().span();
    let outcome = tokio::select! {
        outcome = orchestrator.run(&command, options) => outcome?,
        _ = shutdown_signal() => {
            // Dropping the run kills the command and releases the lock.
            warn!(parent: &span, "interrupted");
            return Ok(INTERRUPTED_EXIT_CODE);
        }
    };

    match outcome {
        RunOutcome::Failed { code } => Err(GateError::CommandFailed { command, code }),
        _ => Ok(0),
    }
}

async fn run_workspaces(
    fs: &dyn FileSystem,
    ctx: &RunContext,
    config: &ConfigFile,
    exec: ExecArgs,
    args: &CliArgs,
) -> Result<i32> {
    let flags = WorkerFlags {
        command: exec.command,
        watch: exec.watch,
        force: exec.force,
        dry: exec.dry,
        debounce_ms: exec.debounce_ms,
        log_level: args.log_level.map(|l| l.as_str().to_string()),
    };

    let supervisor =
        WorkspaceSupervisor::for_current_exe(fs, ctx, config.workspaces(), &flags)?;
    info!(
        parent: &ctx.span(),
        workspaces = ?config.workspaces(),
        "starting workspace workers"
    );

    let report = supervisor.run(shutdown_signal()).await?;
    let code = report.exit_code();
    info!(parent: &ctx.span(), exit_code = code, interrupted = report.interrupted, "workspace workers finished");
    Ok(code)
}

fn build_orchestrator(
    ctx: RunContext,
    config: Arc<ConfigFile>,
    fs: Arc<dyn FileSystem>,
) -> RunOrchestrator<ShellCommandRunner> {
    let store = Box::new(FileHashStore::new(Arc::clone(&fs)));
    RunOrchestrator::new(ctx, config, fs, store, ShellCommandRunner::new())
}

/// Absolute base directory: `--base` if given, else the working directory.
///
/// Absolute so that watcher events (always absolute) can be made relative.
fn resolve_base_dir(base: Option<&Path>) -> Result<PathBuf> {
    let base = match base {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(std::path::absolute(base)?)
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
