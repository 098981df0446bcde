// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::{GateError, Result};
use crate::fingerprint::WatchPatterns;

/// A relevant filesystem change, relative to the watched base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub path: String,
}

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and forwards a
/// [`ChangeNotice`] for every changed path matching `patterns`.
///
/// Access events and the tool's own state files are filtered out, so reading
/// files for a fingerprint or persisting the hash never schedules another run.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    patterns: WatchPatterns,
    changes_tx: mpsc::UnboundedSender<ChangeNotice>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);
    let callback_root = root.clone();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_content_event(&event.kind) {
                    return;
                }
                for path in &event.paths {
                    let Some(rel) = relative_to(&callback_root, path) else {
                        continue;
                    };
                    if patterns.matches(&rel) {
                        // The receiver is gone once watching stops; nothing to do then.
                        let _ = changes_tx.send(ChangeNotice { path: rel });
                    }
                }
            }
            Err(err) => {
                // We can't log via tracing here easily, so fallback to stderr.
                eprintln!("buildgate: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(|e| GateError::Other(e.into()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| GateError::Other(e.into()))?;

    info!("file watcher started on {:?}", root);
    Ok(WatcherHandle { _inner: watcher })
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// `path` relative to `root`, `/`-separated.
///
/// Falls back to canonicalizing `path` for platforms that report events under
/// a different absolute prefix (e.g. `/private/var` on macOS). Deleted files
/// cannot be canonicalized and are only matched through the fast path.
fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.canonicalize().ok()?.strip_prefix(root).ok()?.to_path_buf(),
    };
    let rel = rel.to_string_lossy().replace('\\', "/");
    (!rel.is_empty()).then_some(rel)
}
