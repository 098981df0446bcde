// src/types.rs

//! Small value types shared across the crate.

use std::fmt;

/// Config file name, resolved against the base directory.
pub const CONFIG_FILE_NAME: &str = ".buildgate.json";

/// Hash state file name, resolved against the base directory.
pub const HASH_FILE_NAME: &str = ".buildgate-hash";

/// Lock marker file name, resolved against the base directory.
pub const LOCK_FILE_NAME: &str = ".buildgate-lock";

/// On-disk token meaning "no build has ever completed".
pub const NEVER_BUILT_SENTINEL: &str = "<init>";

/// Returns true for the tool's own state files, which are never fingerprinted
/// and never trigger a watch run.
pub fn is_state_file(rel_path: &str) -> bool {
    matches!(rel_path, HASH_FILE_NAME | LOCK_FILE_NAME)
}

/// Digest summarizing the content of all watched files at a point in time.
///
/// Hex-encoded BLAKE3; consumers only compare for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The last persisted fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashRecord {
    /// No state file, or the sentinel written by `init`.
    Never,
    /// Whatever text the state file holds. Not validated: a truncated or
    /// corrupted record simply fails to match and counts as "changed".
    Recorded(String),
}

impl HashRecord {
    /// Interpret the raw contents of the state file.
    pub fn parse(raw: &str) -> Self {
        if raw == NEVER_BUILT_SENTINEL {
            HashRecord::Never
        } else {
            HashRecord::Recorded(raw.to_string())
        }
    }

    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        match self {
            HashRecord::Never => false,
            HashRecord::Recorded(raw) => raw == fingerprint.as_str(),
        }
    }
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashRecord::Never => f.write_str(NEVER_BUILT_SENTINEL),
            HashRecord::Recorded(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_never_matches() {
        let record = HashRecord::parse(NEVER_BUILT_SENTINEL);
        assert_eq!(record, HashRecord::Never);
        assert!(!record.matches(&Fingerprint::from_hex(NEVER_BUILT_SENTINEL)));
    }

    #[test]
    fn truncated_record_counts_as_changed() {
        let fp = Fingerprint::from_hex("abcdef");
        assert!(HashRecord::parse("abcdef").matches(&fp));
        assert!(!HashRecord::parse("abc").matches(&fp));
        assert!(!HashRecord::parse("abcdef\n").matches(&fp));
    }

    #[test]
    fn state_files_are_recognised() {
        assert!(is_state_file(".buildgate-hash"));
        assert!(is_state_file(".buildgate-lock"));
        assert!(!is_state_file(".buildgate.json"));
        assert!(!is_state_file("src/.buildgate-hash"));
    }
}
