// src/fingerprint/mod.rs

//! Content fingerprinting.
//!
//! A fingerprint is the BLAKE3 digest of one `relPath:fileDigest` line per
//! matched file, in pattern order then expansion order. File reads run
//! concurrently on the blocking pool, but lines are always assembled in
//! expansion order.

pub mod hash;
pub mod patterns;

use std::sync::Arc;

use tracing::debug;

use crate::context::RunContext;
use crate::errors::{GateError, Result};
use crate::fs::FileSystem;
use crate::types::Fingerprint;

pub use hash::{compute_file_hash, digest_lines, render_lines};
pub use patterns::WatchPatterns;

#[derive(Debug, Clone)]
pub struct Fingerprinter {
    fs: Arc<dyn FileSystem>,
}

impl Fingerprinter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Fingerprint the files matched by `patterns` under the context's base
    /// directory.
    ///
    /// Any unreadable matched file fails the whole computation with
    /// [`GateError::FileUnreadable`].
    pub async fn compute(&self, ctx: &RunContext, patterns: &WatchPatterns) -> Result<Fingerprint> {
        let files = {
            let fs = Arc::clone(&self.fs);
            let base = ctx.base_dir().to_path_buf();
            let patterns = patterns.clone();
            tokio::task::spawn_blocking(move || patterns.expand(fs.as_ref(), &base))
                .await
                .map_err(|e| GateError::Other(e.into()))??
        };
        debug!(files = files.len(), "expanded watch patterns");

        // Spawn every read up front, then await in expansion order.
        let reads: Vec<_> = files
            .into_iter()
            .map(|rel| {
                let fs = Arc::clone(&self.fs);
                let path = ctx.base_dir().join(&rel);
                tokio::task::spawn_blocking(move || {
                    compute_file_hash(fs.as_ref(), &path)
                        .map(|digest| (rel, digest))
                        .map_err(|e| GateError::FileUnreadable {
                            path,
                            reason: format!("{e:#}"),
                        })
                })
            })
            .collect();

        let mut entries = Vec::with_capacity(reads.len());
        for read in reads {
            entries.push(read.await.map_err(|e| GateError::Other(e.into()))??);
        }

        let fingerprint = digest_lines(&render_lines(&entries));
        debug!(%fingerprint, files = entries.len(), "computed fingerprint");
        Ok(fingerprint)
    }
}
