//! Logging setup. The TUI owns the terminal, so it logs to a file in the
//! config directory; one-shot subcommands log to stderr.
//!
//! `RUST_LOG` overrides the default filter in both cases.

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use anyhow::Result;
use gita_core::Config;
use tracing_subscriber::EnvFilter;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Append `info`-level logs to `gita.log` in the config directory.
pub fn init_file_logging() -> Result<()> {
    let path = Config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(path = %path.display(), "logging to file");
    Ok(())
}

/// Log to stderr; warnings only unless `verbose`.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(if verbose { "info" } else { "warn" }))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
