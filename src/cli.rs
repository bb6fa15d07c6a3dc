// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchlines`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchlines",
    version,
    about = "Print a file's lines every time its content settles.",
    long_about = None
)]
pub struct CliArgs {
    /// Files to watch. Each must exist when the watch starts.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Path to a config file (TOML).
    ///
    /// Default: `watchlines.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override `[watch].poll_interval_ms`.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Override `[watch].retry_delay_ms`.
    #[arg(long, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Rely on polling only; do not subscribe to OS change notifications.
    #[arg(long)]
    pub no_notify: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHLINES_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and check the files, print the result, but don't watch.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
