//! Error types for speedsensor.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal conditions. Any of these suppresses the sensor markup entirely.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("speedtest executable not found (searched: {})", format_searched(.searched))]
    ExecutableNotFound { searched: Vec<PathBuf> },

    #[error("failed to launch {}: {source}", show_path(.path))]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no successful measurement after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },

    #[error("unexpected result shape, missing: {}", join_fields(.missing))]
    UnexpectedResultShape { missing: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),
}

impl SensorError {
    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            SensorError::ExecutableNotFound { .. } => "executable_not_found",
            SensorError::Launch { .. } => "launch_failed",
            SensorError::RetriesExhausted { .. } => "retries_exhausted",
            SensorError::UnexpectedResultShape { .. } => "unexpected_result_shape",
            SensorError::Config(_) => "config",
        }
    }
}

fn show_path(path: &Path) -> String {
    path.display().to_string()
}

fn join_fields(fields: &[String]) -> String {
    fields.join(", ")
}

fn format_searched(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return "nothing".to_string();
    }
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a single attempt did not produce a usable result. Always retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    #[error("output is not a JSON record: {0}")]
    Parse(String),

    #[error("tool reported '{kind}' instead of a result{}", suffix(.message))]
    WrongKind {
        kind: String,
        message: Option<String>,
    },
}

fn suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}
