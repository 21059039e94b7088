//! Tracing subscriber setup.
//!
//! The terminal belongs to the UI, so events are written to a log file.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig, path: &Path) -> Result<()> {
    let json = match config.format.as_str() {
        "json" => true,
        "pretty" => false,
        other => bail!("Unknown log format {:?} (expected \"pretty\" or \"json\")", other),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Opening log file {:?}", path))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level {:?}", config.level))?;

    let builder = fmt().with_env_filter(filter).with_ansi(false).with_writer(Mutex::new(file));
    let installed = if json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| anyhow!(e))
}
