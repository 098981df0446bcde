// src/config/model.rs

use serde::{Deserialize, Serialize};

use crate::fingerprint::WatchPatterns;

/// Config file as read from `.buildgate.json`, before validation.
///
/// ```json
/// {
///   "command": "npm run build",
///   "watch": ["src/**", "package.json"],
///   "workspaces": ["packages/web", "packages/api"]
/// }
/// ```
///
/// `cmd` is accepted as an alias of `command`. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Build command, run through the platform shell in the base directory.
    #[serde(default, alias = "cmd")]
    pub command: String,

    /// Glob patterns relative to the base directory. Order is significant: it
    /// is the order in which files enter the fingerprint.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Sub-directories that each get their own worker process.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<String>,
}

impl RawConfigFile {
    /// The config written by `buildgate init`.
    pub fn scaffold() -> Self {
        Self {
            command: "npm run build".to_string(),
            watch: vec!["src/**".to_string()],
            workspaces: Vec::new(),
        }
    }
}

/// Validated configuration. Immutable for the duration of a run.
///
/// Construct through `ConfigFile::try_from(RawConfigFile)` (see `validate.rs`)
/// or [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    command: String,
    watch: WatchPatterns,
    workspaces: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        command: String,
        watch: WatchPatterns,
        workspaces: Vec<String>,
    ) -> Self {
        Self {
            command,
            watch,
            workspaces,
        }
    }

    /// Configured command, if any.
    pub fn command(&self) -> Option<&str> {
        let cmd = self.command.trim();
        if cmd.is_empty() { None } else { Some(cmd) }
    }

    /// Command to run: the override when given, else the configured one.
    pub fn resolve_command<'a>(&'a self, override_cmd: Option<&'a str>) -> Option<&'a str> {
        override_cmd
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| self.command())
    }

    pub fn watch(&self) -> &WatchPatterns {
        &self.watch
    }

    pub fn workspaces(&self) -> &[String] {
        &self.workspaces
    }

    pub fn has_workspaces(&self) -> bool {
        !self.workspaces.is_empty()
    }
}
