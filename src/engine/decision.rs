// src/engine/decision.rs

//! Pure skip/run decision.
//!
//! Kept free of IO so the comparison rules can be tested directly.

use crate::types::{Fingerprint, HashRecord};

/// Why a run goes ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunReason {
    /// `--force` was given.
    Forced,
    /// No successful build was ever recorded.
    NeverBuilt,
    /// The recorded fingerprint differs from the current one.
    Changed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run(RunReason),
    Skip,
}

impl Decision {
    pub fn should_run(&self) -> bool {
        matches!(self, Decision::Run(_))
    }
}

/// Compare the recorded state against the current fingerprint.
pub fn decide(last: &HashRecord, current: &Fingerprint, force: bool) -> Decision {
    if force {
        return Decision::Run(RunReason::Forced);
    }
    match last {
        HashRecord::Never => Decision::Run(RunReason::NeverBuilt),
        record if record.matches(current) => Decision::Skip,
        HashRecord::Recorded(_) => Decision::Run(RunReason::Changed),
    }
}
