// src/fingerprint/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobMatcher};

use crate::errors::{GateError, Result};
use crate::fs::FileSystem;
use crate::types::is_state_file;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}', '\\'];

/// Compiled watch patterns, in configured order.
///
/// Patterns are relative to the base directory. `*` does not cross `/`; `**`
/// does. Wildcards never match a path component starting with `.`: such a
/// component is only matched when the pattern spells out a dot component for
/// it (`.github/**`, `**/.env`, `.*`).
#[derive(Clone)]
pub struct WatchPatterns {
    raw: Vec<String>,
    entries: Vec<PatternEntry>,
}

#[derive(Clone)]
struct PatternEntry {
    matcher: GlobMatcher,
    /// Leading components without glob syntax; expansion starts walking here.
    prefix: PathBuf,
    /// True when the whole pattern is a plain path.
    literal: bool,
    /// The pattern's own components that start with `.`, one matcher each.
    dot_components: Vec<GlobMatcher>,
}

impl fmt::Debug for WatchPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchPatterns")
            .field("patterns", &self.raw)
            .finish_non_exhaustive()
    }
}

impl WatchPatterns {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut entries = Vec::with_capacity(patterns.len());

        for pat in patterns {
            let normalized = normalize(pat);
            let matcher = GlobBuilder::new(normalized)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid glob pattern: {pat}"))
                .map_err(|e| GateError::ConfigError(format!("{e:#}")))?
                .compile_matcher();

            let (prefix, literal) = literal_prefix(normalized);
            let dot_components = normalized
                .split('/')
                .filter(|c| c.starts_with('.'))
                .map(|c| {
                    GlobBuilder::new(c)
                        .literal_separator(true)
                        .build()
                        .map(|g| g.compile_matcher())
                        .map_err(|e| GateError::ConfigError(format!("invalid glob pattern {pat}: {e}")))
                })
                .collect::<Result<Vec<_>>>()?;
            entries.push(PatternEntry {
                matcher,
                prefix,
                literal,
                dot_components,
            });
        }

        Ok(Self {
            raw: patterns.to_vec(),
            entries,
        })
    }

    /// Patterns as written in the config.
    pub fn patterns(&self) -> &[String] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if any pattern matches the given path (relative to the
    /// base directory, `/`-separated). State files never match.
    pub fn matches(&self, rel_path: &str) -> bool {
        !is_state_file(rel_path) && self.entries.iter().any(|e| e.is_match(rel_path))
    }

    /// Expand every pattern against `base`, excluding directories.
    ///
    /// Results are concatenated pattern by pattern in configured order. Within
    /// one pattern, files appear in walk order (directory entries sorted by
    /// name, depth first). A file matched by two patterns appears twice.
    pub fn expand(&self, fs: &dyn FileSystem, base: &Path) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for entry in &self.entries {
            entry.expand_into(fs, base, &mut out)?;
        }
        Ok(out)
    }
}

impl PatternEntry {
    fn is_match(&self, rel: &str) -> bool {
        self.matcher.is_match(rel) && rel.split('/').all(|c| self.allows_component(c))
    }

    /// Dot components are only visible to a pattern that names them.
    fn allows_component(&self, name: &str) -> bool {
        !name.starts_with('.') || self.dot_components.iter().any(|m| m.is_match(name))
    }

    fn expand_into(&self, fs: &dyn FileSystem, base: &Path, out: &mut Vec<String>) -> Result<()> {
        let start = base.join(&self.prefix);

        if self.literal {
            if fs.exists(&start) && !fs.is_dir(&start) {
                self.push_if_match(base, &start, out);
            }
            return Ok(());
        }

        if !fs.is_dir(&start) {
            return Ok(());
        }
        self.walk(fs, base, &start, out)
    }

    fn walk(&self, fs: &dyn FileSystem, base: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for path in fs.read_dir(dir)? {
            if fs.is_dir(&path) {
                // Symlinked directories are not crawled; they may point back up.
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !self.allows_component(n));
                if !hidden && !fs.is_symlink(&path) {
                    self.walk(fs, base, &path, out)?;
                }
            } else {
                // Anything that is not a directory is a candidate, including
                // dangling symlinks, so reading it later surfaces the error.
                self.push_if_match(base, &path, out);
            }
        }
        Ok(())
    }

    fn push_if_match(&self, base: &Path, path: &Path, out: &mut Vec<String>) {
        if let Ok(rel) = path.strip_prefix(base) {
            let rel = rel.to_string_lossy().replace('\\', "/");
            if !is_state_file(&rel) && self.is_match(&rel) {
                out.push(rel);
            }
        }
    }
}

fn normalize(pattern: &str) -> &str {
    let mut p = pattern.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}

/// Split off the leading path components that contain no glob syntax.
fn literal_prefix(pattern: &str) -> (PathBuf, bool) {
    let mut prefix = PathBuf::new();
    for component in pattern.split('/') {
        if component.contains(GLOB_META) {
            return (prefix, false);
        }
        if !component.is_empty() {
            prefix.push(component);
        }
    }
    (prefix, true)
}
