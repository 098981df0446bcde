// src/engine/mod.rs

//! Run orchestration.
//!
//! - [`decision`] holds the pure skip/run comparison.
//! - [`orchestrator`] composes fingerprinting, the hash store, the lock and
//!   the command runner into a single run.

pub mod decision;
pub mod orchestrator;

use crate::types::Fingerprint;

pub use decision::{decide, Decision, RunReason};
pub use orchestrator::RunOrchestrator;

/// Flags for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run even if nothing changed.
    pub force: bool,
    /// Run, but do not persist the new fingerprint afterwards.
    pub dry: bool,
}

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run holds the lock marker; nothing was touched.
    SkippedLocked,
    /// The fingerprint matches the last successful build.
    SkippedUnchanged,
    /// The command exited successfully.
    Succeeded {
        fingerprint: Fingerprint,
        /// False for dry runs.
        persisted: bool,
    },
    /// The command exited non-zero; the hash was left alone.
    Failed { code: i32 },
}

impl RunOutcome {
    pub fn executed(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. } | RunOutcome::Failed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}
