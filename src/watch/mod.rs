// src/watch/mod.rs

//! File watching and debounced re-runs.
//!
//! - [`watcher`] wires up a cross-platform filesystem watcher (`notify`) and
//!   turns raw events into [`ChangeNotice`]s for paths matching the watch
//!   patterns.
//! - [`debounce`] holds the quiescence-window state.
//! - [`scheduler`] is the `select!` loop that fires one run per settled burst.

pub mod debounce;
pub mod scheduler;
pub mod watcher;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn, Instrument};

use crate::engine::{RunOptions, RunOrchestrator};
use crate::errors::Result;
use crate::exec::CommandRunner;
use crate::state::LockGuard;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use scheduler::{OrchestratorTrigger, RunTrigger, WatchScheduler, WatchSummary};
pub use watcher::{spawn_watcher, ChangeNotice, WatcherHandle};

/// Run once, then keep re-running `command` whenever watched files change.
///
/// Returns when `shutdown` resolves. On the way out the base directory's lock
/// marker is removed in case an interrupted run left it behind.
pub async fn watch_directory<R, S>(
    orchestrator: RunOrchestrator<R>,
    command: String,
    options: RunOptions,
    window: Duration,
    shutdown: S,
) -> Result<WatchSummary>
where
    R: CommandRunner,
    S: Future<Output = ()>,
{
    let ctx = orchestrator.context().clone();
    let fs = Arc::clone(orchestrator.file_system());
    let patterns = orchestrator.config().watch().clone();

    if patterns.is_empty() {
        warn!(parent: &ctx.span(), "no watch patterns configured; changes will never trigger a run");
    }

    let (changes_tx, changes_rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(ctx.base_dir(), patterns, changes_tx)?;

    let mut trigger = OrchestratorTrigger::new(orchestrator, command, options);

    // Bring the tree up to date before waiting for changes.
    if let Err(e) = trigger.fire().await {
        warn!(parent: &ctx.span(), error = %e, "initial run aborted");
    }

    let summary = WatchScheduler::new(window)
        .run(changes_rx, &mut trigger, shutdown)
        .instrument(ctx.span())
        .await;

    if let Err(e) = LockGuard::clear(fs.as_ref(), &ctx) {
        warn!(parent: &ctx.span(), error = %e, "failed to clear lock marker on exit");
    }
    info!(parent: &ctx.span(), runs = summary.runs, "watch stopped");

    Ok(summary)
}
