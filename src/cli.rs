// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `buildgate`.
///
/// Without a subcommand the top-level arguments behave like `exec`, so
/// `buildgate "make all"` and `buildgate exec "make all"` are the same.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildgate",
    version,
    about = "Run a build command only when the watched files changed.",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct CliArgs {
    /// Directory holding `.buildgate.json` and the state files.
    ///
    /// Default: the current working directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDGATE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Single-directory mode even if the config lists workspaces.
    #[arg(long, global = true, hide = true)]
    pub worker: bool,

    /// Log label for this process (the workspace path in workers).
    #[arg(long, global = true, hide = true, value_name = "LABEL")]
    pub label: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub exec: ExecArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write a default `.buildgate.json` and reset the hash state.
    Init,
    /// Run the build command if the watched files changed.
    Exec(ExecArgs),
    /// Report whether the watched files changed (exit 0 changed, 1 unchanged).
    Changed(ChangedArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExecArgs {
    /// Command to run instead of the configured one.
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Run even if nothing changed.
    #[arg(short, long)]
    pub force: bool,

    /// Run without recording the new hash.
    #[arg(short, long)]
    pub dry: bool,

    /// Keep running and re-run on every change.
    #[arg(short, long)]
    pub watch: bool,

    /// Quiescence window for `--watch`, in milliseconds (default 300).
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ChangedArgs {
    /// Record the current hash whether or not anything changed.
    #[arg(short, long)]
    pub update: bool,

    /// Always report "changed".
    #[arg(short, long)]
    pub force: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Name accepted by `--log-level`, used when forwarding to workers.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl CliArgs {
    /// The subcommand to dispatch, with bare invocations mapped to `exec`.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Exec(self.exec.clone()))
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
