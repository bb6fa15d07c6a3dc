// src/lib.rs

//! Watch a single file and receive its full current lines whenever it
//! changes, with bursts of writes coalesced into one delivery.
//!
//! ```no_run
//! use watchlines::types::{on_error, on_lines};
//!
//! watchlines::watch_file_lines(
//!     "settings.txt",
//!     on_lines(|lines| println!("{} lines", lines.len())),
//!     on_error(|err| eprintln!("{err}")),
//!     true,
//! )?;
//! # Ok::<(), watchlines::errors::WatchError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path};
use crate::engine::{FileWatchEngine, WatchedFile};
use crate::fs::{FileSystem, RealFileSystem, parent_dir};
use crate::types::{ErrorCallback, LinesCallback, WatchOptions, on_error, on_lines};

/// Watch `path` with the process-wide engine.
///
/// See [`FileWatchEngine::watch_file_lines`]. The global engine is created
/// with default options on first use (or by [`engine::init_global`]) and
/// lives until the process exits.
pub fn watch_file_lines(
    path: impl Into<PathBuf>,
    on_changed: Option<LinesCallback>,
    on_error: Option<ErrorCallback>,
    watch: bool,
) -> errors::Result<WatchedFile> {
    engine::global()?.watch_file_lines(path, on_changed, on_error, watch)
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (file + CLI overrides)
/// - one watch per file, printing each delivery to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let options = cfg.watch_options();

    if args.dry_run {
        print_dry_run(&args, &options);
        return Ok(());
    }

    let engine = FileWatchEngine::with_handle(Handle::current(), options);

    for file in &args.files {
        let label = file.display().to_string();
        let err_label = label.clone();

        let on_changed = on_lines(move |lines| {
            let mut out = std::io::stdout().lock();
            let mut write = || -> std::io::Result<()> {
                writeln!(out, "==> {label} <==")?;
                for line in &lines {
                    writeln!(out, "{line}")?;
                }
                out.flush()
            };
            if let Err(err) = write() {
                warn!(error = %err, "failed to write to stdout");
            }
        });
        let on_err = on_error(move |err| {
            warn!(path = %err_label, error = %err, "watch error");
        });

        engine
            .watch_file_lines(file.clone(), on_changed, on_err, engine.options().notify)
            .with_context(|| format!("starting watch on {:?}", file))?;
    }

    info!(files = engine.len(), "watching; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;
    info!("shutdown requested");
    Ok(())
}

/// Merge the config file (explicit `--config`, else `watchlines.toml` if it
/// exists, else defaults) with CLI overrides, then validate the result.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config file {:?}", path))?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(?path, "using default config file");
                load_from_path(&path)
                    .with_context(|| format!("loading config file {:?}", path))?
            } else {
                RawConfigFile::default()
            }
        }
    };

    if let Some(ms) = args.poll_interval_ms {
        raw.watch.poll_interval_ms = ms;
    }
    if let Some(ms) = args.retry_delay_ms {
        raw.watch.retry_delay_ms = ms;
    }
    if args.no_notify {
        raw.watch.notify = false;
    }

    Ok(ConfigFile::try_from(raw)?)
}

/// Simple dry-run output: effective options and whether each file could be
/// watched right now.
fn print_dry_run(args: &CliArgs, options: &WatchOptions) {
    let fs = RealFileSystem;

    println!("watchlines dry-run");
    println!("  poll_interval = {:?}", options.poll_interval);
    println!("  retry_delay   = {:?}", options.retry_delay);
    println!("  notify        = {}", options.notify);
    println!();

    println!("files ({}):", args.files.len());
    for file in &args.files {
        let status = if !fs.is_dir(&parent_dir(file)) {
            "directory not found"
        } else if !fs.is_file(file) {
            "file not found"
        } else {
            "ok"
        };
        println!("  - {}: {status}", file.display());
    }

    debug!("dry-run complete (no watching)");
}
