use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use buildgate::context::RunContext;
use buildgate::errors::Result;
use buildgate::exec::{CommandOutcome, CommandRunner};
use buildgate::fs::FileSystem;

/// One call observed by [`FakeRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub label: String,
    pub command: String,
    /// Whether the lock marker existed while the command "ran". Only filled
    /// in when the runner has a lock probe.
    pub lock_held: Option<bool>,
}

/// A fake command runner that:
/// - records every command it is asked to run
/// - returns scripted outcomes (queued first, then the default)
/// - can be held open with a gate to simulate a long build.
#[derive(Clone)]
pub struct FakeRunner {
    runs: Arc<Mutex<Vec<RecordedRun>>>,
    scripted: Arc<Mutex<VecDeque<CommandOutcome>>>,
    default_outcome: CommandOutcome,
    lock_probe: Option<Arc<dyn FileSystem>>,
    started: Arc<Notify>,
    gate: Option<Arc<Notify>>,
}

impl FakeRunner {
    /// Every command succeeds.
    pub fn new() -> Self {
        Self::with_default(CommandOutcome::Success)
    }

    /// Every command exits with `code`.
    pub fn failing(code: i32) -> Self {
        Self::with_default(CommandOutcome::Failed(code))
    }

    fn with_default(default_outcome: CommandOutcome) -> Self {
        Self {
            runs: Arc::new(Mutex::new(Vec::new())),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            default_outcome,
            lock_probe: None,
            started: Arc::new(Notify::new()),
            gate: None,
        }
    }

    /// Queue an outcome for the next call that has none queued before it.
    pub fn push_outcome(&self, outcome: CommandOutcome) {
        self.scripted.lock().unwrap().push_back(outcome);
    }

    /// Record whether the context's lock marker exists on `fs` during each run.
    pub fn with_lock_probe(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.lock_probe = Some(fs);
        self
    }

    /// Block every run until the returned handle is notified (once per run).
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Notified (once per run) when a run starts.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        ctx: &'a RunContext,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let lock_held = self
                .lock_probe
                .as_ref()
                .map(|fs| fs.exists(&ctx.lock_path()));

            self.runs.lock().unwrap().push(RecordedRun {
                label: ctx.label().to_string(),
                command: command.to_string(),
                lock_held,
            });
            self.started.notify_one();

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            let outcome = self
                .scripted
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default_outcome);
            Ok(outcome)
        })
    }
}
