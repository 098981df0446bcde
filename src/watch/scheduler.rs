// src/watch/scheduler.rs

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::engine::{RunOptions, RunOrchestrator, RunOutcome};
use crate::errors::Result;
use crate::exec::CommandRunner;
use crate::watch::debounce::Debouncer;
use crate::watch::watcher::ChangeNotice;

/// Something the scheduler can kick off once a quiet period has elapsed.
///
/// Implemented by [`OrchestratorTrigger`] in production; tests use counters.
pub trait RunTrigger: Send {
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs the orchestrator with a fixed command and flags on every trigger.
///
/// Failed commands are logged and do not stop watching.
#[derive(Debug)]
pub struct OrchestratorTrigger<R: CommandRunner> {
    orchestrator: RunOrchestrator<R>,
    command: String,
    options: RunOptions,
}

impl<R: CommandRunner> OrchestratorTrigger<R> {
    pub fn new(orchestrator: RunOrchestrator<R>, command: impl Into<String>, options: RunOptions) -> Self {
        Self {
            orchestrator,
            command: command.into(),
            options,
        }
    }
}

impl<R: CommandRunner> RunTrigger for OrchestratorTrigger<R> {
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let outcome = self.orchestrator.run(&self.command, self.options).await?;
            if let RunOutcome::Failed { code } = outcome {
                warn!(exit_code = code, "run failed; still watching");
            }
            Ok(())
        })
    }
}

/// How a watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchSummary {
    /// Runs triggered by settled change bursts.
    pub runs: usize,
    /// Notifications received in total.
    pub notifications: usize,
}

/// Debounced single-threaded scheduler.
///
/// Each change notice restarts the quiescence window; when it elapses, the
/// trigger fires exactly once. The trigger is awaited inline, so runs never
/// overlap; notices that arrive meanwhile wait in the channel and start a new
/// window afterwards.
#[derive(Debug, Clone)]
pub struct WatchScheduler {
    debouncer: Debouncer,
}

impl WatchScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
        }
    }

    /// Drive the loop until `shutdown` resolves or the change stream closes.
    ///
    /// Errors from a triggered run are logged; watching continues.
    pub async fn run<T, S>(
        mut self,
        mut changes: mpsc::UnboundedReceiver<ChangeNotice>,
        trigger: &mut T,
        shutdown: S,
    ) -> WatchSummary
    where
        T: RunTrigger,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = WatchSummary::default();

        info!(window_ms = self.debouncer.window().as_millis() as u64, "watching for changes");

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("shutdown requested; stopping watch");
                    break;
                }

                change = changes.recv() => match change {
                    Some(notice) => {
                        debug!(path = %notice.path, "change noticed");
                        summary.notifications += 1;
                        self.debouncer.notify(Instant::now());
                    }
                    None => {
                        info!("change stream closed; stopping watch");
                        break;
                    }
                },

                _ = sleep_until_deadline(deadline), if deadline.is_some() => {
                    if let Some(coalesced) = self.debouncer.take_due(Instant::now()) {
                        info!(coalesced, "changes settled; triggering run");
                        summary.runs += 1;
                        if let Err(e) = trigger.fire().await {
                            error!(error = %e, "run aborted");
                        }
                    }
                }
            }
        }

        summary
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
