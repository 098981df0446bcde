// src/state/hash_store.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::context::RunContext;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{Fingerprint, HashRecord, NEVER_BUILT_SENTINEL};

/// Abstract storage for the last successful fingerprint of a base directory.
pub trait HashStore: Send + Sync {
    /// Last persisted record, or [`HashRecord::Never`] when none exists.
    fn load(&self, ctx: &RunContext) -> Result<HashRecord>;

    /// Overwrite the record with `fingerprint`.
    fn save(&mut self, ctx: &RunContext, fingerprint: &Fingerprint) -> Result<()>;

    /// Write the "never built" sentinel.
    fn reset(&mut self, ctx: &RunContext) -> Result<()>;
}

/// Stores the fingerprint in `<base>/.buildgate-hash`.
///
/// The write is a plain overwrite. A crash mid-write leaves a truncated record,
/// which simply compares unequal on the next run.
#[derive(Debug, Clone)]
pub struct FileHashStore {
    fs: Arc<dyn FileSystem>,
}

impl FileHashStore {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl HashStore for FileHashStore {
    fn load(&self, ctx: &RunContext) -> Result<HashRecord> {
        let path = ctx.hash_path();
        if !self.fs.exists(&path) {
            debug!(path = ?path, "no hash file; never built");
            return Ok(HashRecord::Never);
        }

        let mut bytes = Vec::new();
        self.fs
            .open_read(&path)?
            .read_to_end(&mut bytes)
            .with_context(|| format!("reading hash file {:?}", path))?;

        Ok(HashRecord::parse(&String::from_utf8_lossy(&bytes)))
    }

    fn save(&mut self, ctx: &RunContext, fingerprint: &Fingerprint) -> Result<()> {
        self.fs.write(&ctx.hash_path(), fingerprint.as_str().as_bytes())?;
        info!(hash = %fingerprint, "stored fingerprint (file)");
        Ok(())
    }

    fn reset(&mut self, ctx: &RunContext) -> Result<()> {
        self.fs
            .write(&ctx.hash_path(), NEVER_BUILT_SENTINEL.as_bytes())?;
        Ok(())
    }
}

/// Stores fingerprints in memory only, keyed by base directory.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<PathBuf, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, ctx: &RunContext) -> Result<HashRecord> {
        Ok(self
            .map
            .get(ctx.base_dir())
            .map(|raw| HashRecord::parse(raw))
            .unwrap_or(HashRecord::Never))
    }

    fn save(&mut self, ctx: &RunContext, fingerprint: &Fingerprint) -> Result<()> {
        self.map
            .insert(ctx.base_dir().to_path_buf(), fingerprint.as_str().to_string());
        info!(hash = %fingerprint, "stored fingerprint (memory)");
        Ok(())
    }

    fn reset(&mut self, ctx: &RunContext) -> Result<()> {
        self.map
            .insert(ctx.base_dir().to_path_buf(), NEVER_BUILT_SENTINEL.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn missing_file_loads_as_never() {
        let fs = Arc::new(MockFileSystem::new());
        let store = FileHashStore::new(fs);
        assert_eq!(store.load(&RunContext::root("proj")).unwrap(), HashRecord::Never);
    }

    #[test]
    fn save_writes_exact_digest_without_newline() {
        let fs = Arc::new(MockFileSystem::new());
        let ctx = RunContext::root("proj");
        let mut store = FileHashStore::new(fs.clone());

        let fp = Fingerprint::from_hex("0123abcd");
        store.save(&ctx, &fp).unwrap();

        assert_eq!(fs.contents("proj/.buildgate-hash").unwrap(), b"0123abcd");
        assert!(store.load(&ctx).unwrap().matches(&fp));
    }

    #[test]
    fn garbage_record_never_matches() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("proj/.buildgate-hash", vec![0xff, 0xfe, 0x00]);
        let store = FileHashStore::new(fs);

        let record = store.load(&RunContext::root("proj")).unwrap();
        assert!(matches!(record, HashRecord::Recorded(_)));
        assert!(!record.matches(&Fingerprint::from_hex("0123abcd")));
    }

    #[test]
    fn memory_store_keeps_directories_apart() {
        let mut store = MemoryHashStore::new();
        let a = RunContext::root("a");
        let b = RunContext::root("b");

        store.save(&a, &Fingerprint::from_hex("aa")).unwrap();
        assert_eq!(store.load(&a).unwrap(), HashRecord::Recorded("aa".into()));
        assert_eq!(store.load(&b).unwrap(), HashRecord::Never);

        store.reset(&a).unwrap();
        assert_eq!(store.load(&a).unwrap(), HashRecord::Never);
    }
}
