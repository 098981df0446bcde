// src/context.rs

//! Per-directory run context.
//!
//! Every component receives the base directory and the log label explicitly
//! through a [`RunContext`] instead of reading process-wide state, so several
//! contexts can coexist in one process (tests) or in sibling workers.

use std::path::{Path, PathBuf};

use tracing::Span;

use crate::types::{CONFIG_FILE_NAME, HASH_FILE_NAME, LOCK_FILE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    base_dir: PathBuf,
    label: String,
}

impl RunContext {
    pub fn new(base_dir: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            label: label.into(),
        }
    }

    /// Context for the base directory itself, labelled `"."`.
    pub fn root(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(base_dir, ".")
    }

    /// Context for a workspace below this one.
    pub fn child(&self, rel: &str) -> Self {
        Self::new(self.base_dir.join(rel), rel)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    pub fn hash_path(&self) -> PathBuf {
        self.base_dir.join(HASH_FILE_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(LOCK_FILE_NAME)
    }

    /// Span that prefixes every log line emitted on behalf of this context.
    pub fn span(&self) -> Span {
        tracing::info_span!("buildgate", dir = %self.label)
    }
}
