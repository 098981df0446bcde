#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use buildgate::config::{ConfigFile, RawConfigFile};
use buildgate::context::RunContext;
use buildgate::types::{CONFIG_FILE_NAME, HASH_FILE_NAME, LOCK_FILE_NAME};

/// Builder for `ConfigFile` / `.buildgate.json` to simplify test setup.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            config: RawConfigFile {
                command: command.to_string(),
                watch: Vec::new(),
                workspaces: Vec::new(),
            },
        }
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.config.watch.push(pattern.to_string());
        self
    }

    pub fn workspace(mut self, path: &str) -> Self {
        self.config.workspaces.push(path.to_string());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.config).expect("config serializes")
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// A project directory on the real filesystem, removed on drop.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn ctx(&self) -> RunContext {
        RunContext::root(self.dir.path())
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        self
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.join(rel)).expect("remove file");
    }

    pub fn rename(&self, from: &str, to: &str) {
        let to = self.join(to);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::rename(self.join(from), to).expect("rename file");
    }

    pub fn write_config(&self, config: &ConfigBuilder) -> &Self {
        self.write(CONFIG_FILE_NAME, config.to_json())
    }

    /// Raw contents of the hash state file, if present.
    pub fn hash_record(&self) -> Option<String> {
        fs::read_to_string(self.join(HASH_FILE_NAME)).ok()
    }

    pub fn lock_exists(&self) -> bool {
        self.join(LOCK_FILE_NAME).exists()
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
