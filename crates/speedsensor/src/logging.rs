//! Logging setup for speedsensor
//!
//! stdout carries the sensor markup only, so console diagnostics go to
//! stderr. With `--debug` a plain-text debug log is also written to a file.

use crate::config::SensorConfig;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment override for the debug log location
pub const LOG_FILE_ENV: &str = "SPEEDSENSOR_LOG_FILE";

/// Discover debug log path with fallback chain
///
/// Priority:
/// 1. explicit `--log-file` / config value
/// 2. $SPEEDSENSOR_LOG_FILE environment variable
/// 3. $XDG_STATE_HOME/speedsensor/debug.log (XDG standard)
/// 4. ~/.local/state/speedsensor/debug.log (XDG fallback)
pub fn discover_log_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(LOG_FILE_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        if !xdg_state.is_empty() {
            return Some(Path::new(&xdg_state).join("speedsensor").join("debug.log"));
        }
    }

    dirs::home_dir().map(|home| {
        home.join(".local")
            .join("state")
            .join("speedsensor")
            .join("debug.log")
    })
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create log directory {}", parent.display()))?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

/// Install the global subscriber. Returns the debug log path when one is
/// active. Call once, from `main`.
///
/// The console layer is installed even when the debug log cannot be
/// opened; that failure is returned after the subscriber is live.
pub fn init(config: &SensorConfig) -> Result<Option<PathBuf>> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_filter(console_filter);

    let opened = if config.debug {
        Some(
            discover_log_path(config.log_file.as_deref())
                .context("no location for the debug log; pass --log-file")
                .and_then(|path| open_log_file(&path).map(|file| (file, path))),
        )
    } else {
        None
    };

    let (file_layer, log_path, file_error) = match opened {
        Some(Ok((file, path))) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(path), None)
        }
        Some(Err(e)) => (None, None, Some(e)),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;

    match file_error {
        Some(e) => Err(e),
        None => Ok(log_path),
    }
}
