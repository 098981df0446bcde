// src/supervisor/worker.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Flags forwarded from the parent invocation to every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerFlags {
    /// Command override given on the parent's command line.
    pub command: Option<String>,
    pub watch: bool,
    pub force: bool,
    pub dry: bool,
    pub debounce_ms: Option<u64>,
    /// Log level name (`"debug"`, ...), forwarded verbatim.
    pub log_level: Option<String>,
}

/// One worker process to start: a single-directory `buildgate exec` for one
/// workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    workspace: String,
    base_dir: PathBuf,
    flags: WorkerFlags,
}

impl WorkerSpec {
    pub fn new(workspace: impl Into<String>, base_dir: impl Into<PathBuf>, flags: WorkerFlags) -> Self {
        Self {
            workspace: workspace.into(),
            base_dir: base_dir.into(),
            flags,
        }
    }

    /// Workspace path as written in the config.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Argument list for the worker:
    ///
    /// `--base <dir> --label <ws> --worker [--log-level L] exec [--watch]
    /// [--force] [--dry] [--debounce-ms N] [-- COMMAND]`
    ///
    /// `--worker` keeps the child in single-directory mode even if its own
    /// config lists workspaces.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--base".into(),
            self.base_dir.clone().into_os_string(),
            "--label".into(),
            self.workspace.clone().into(),
            "--worker".into(),
        ];
        if let Some(level) = &self.flags.log_level {
            args.push("--log-level".into());
            args.push(level.into());
        }

        args.push("exec".into());
        if self.flags.watch {
            args.push("--watch".into());
        }
        if self.flags.force {
            args.push("--force".into());
        }
        if self.flags.dry {
            args.push("--dry".into());
        }
        if let Some(ms) = self.flags.debounce_ms {
            args.push("--debounce-ms".into());
            args.push(ms.to_string().into());
        }
        if let Some(command) = &self.flags.command {
            args.push("--".into());
            args.push(command.into());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn minimal_worker_args() {
        let spec = WorkerSpec::new("pkg/a", "/repo/pkg/a", WorkerFlags::default());
        assert_eq!(
            strings(spec.args()),
            ["--base", "/repo/pkg/a", "--label", "pkg/a", "--worker", "exec"]
        );
    }

    #[test]
    fn flags_and_command_are_forwarded() {
        let flags = WorkerFlags {
            command: Some("-x make".into()),
            watch: true,
            force: true,
            dry: true,
            debounce_ms: Some(50),
            log_level: Some("debug".into()),
        };
        let spec = WorkerSpec::new("b", "/repo/b", flags);
        assert_eq!(
            strings(spec.args()),
            [
                "--base", "/repo/b", "--label", "b", "--worker", "--log-level", "debug", "exec",
                "--watch", "--force", "--dry", "--debounce-ms", "50", "--", "-x make",
            ]
        );
    }
}
