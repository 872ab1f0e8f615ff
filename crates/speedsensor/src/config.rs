//! Configuration management for speedsensor.
//!
//! Settings come from three layers, highest first: command line, optional
//! TOML file, built-in defaults.
//!
//! Config file discovery:
//! 1. `--config <path>` (must exist)
//! 2. `$SPEEDSENSOR_CONFIG` (must exist)
//! 3. `$XDG_CONFIG_HOME/speedsensor/config.toml` or `~/.config/speedsensor/config.toml`
//!    (silently skipped when absent)

use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::Deserialize;
use speedsensor_shared::normalize::MAX_PRECISION;
use speedsensor_shared::retry::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, MAX_RETRIES};
use speedsensor_shared::{RetryPolicy, SensorError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "SPEEDSENSOR_CONFIG";

/// On-disk settings. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_id: Option<u32>,
    pub output_file: Option<PathBuf>,
    pub precision: Option<u8>,
    pub retries: Option<u8>,
    pub accept_gdpr: Option<bool>,
    pub speedtest_path: Option<PathBuf>,
    pub debug: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    pub server_id: Option<u32>,
    pub output_file: Option<PathBuf>,
    pub precision: u8,
    pub retries: u8,
    pub accept_gdpr: bool,
    pub speedtest_path: Option<PathBuf>,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub retry_delay: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            server_id: None,
            output_file: None,
            precision: default_precision(),
            retries: DEFAULT_RETRIES,
            accept_gdpr: false,
            speedtest_path: None,
            debug: false,
            log_file: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

fn default_precision() -> u8 {
    1
}

impl SensorConfig {
    /// Merge CLI over file over defaults, then validate ranges.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, SensorError> {
        let defaults = SensorConfig::default();

        let config = SensorConfig {
            server_id: cli.server_id.or(file.server_id),
            output_file: cli.output_file.clone().or(file.output_file),
            precision: cli.precision.or(file.precision).unwrap_or(defaults.precision),
            retries: cli.retries.or(file.retries).unwrap_or(defaults.retries),
            accept_gdpr: cli.accept_gdpr || file.accept_gdpr.unwrap_or(false),
            speedtest_path: cli.speedtest_path.clone().or(file.speedtest_path),
            debug: cli.debug
                || cli.log_file.is_some()
                || file.debug.unwrap_or(false)
                || file.log_file.is_some(),
            log_file: cli.log_file.clone().or(file.log_file),
            retry_delay: cli
                .retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SensorError> {
        if self.precision > MAX_PRECISION {
            return Err(SensorError::Config(format!(
                "precision must be between 0 and {}, got {}",
                MAX_PRECISION, self.precision
            )));
        }
        if self.retries > MAX_RETRIES {
            return Err(SensorError::Config(format!(
                "retries must be between 0 and {}, got {}",
                MAX_RETRIES, self.retries
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, SensorError> {
        RetryPolicy::new(self.retries, self.retry_delay)
    }
}

/// Locate the config file. The flag reports whether it was named explicitly.
fn discover_config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some((PathBuf::from(path), true));
        }
    }

    dirs::config_dir().map(|dir| (dir.join("speedsensor").join("config.toml"), false))
}

/// Load the effective configuration for this invocation.
pub fn load(cli: &Cli) -> Result<SensorConfig, SensorError> {
    let file = match discover_config_path(cli.config.as_deref()) {
        Some((path, true)) => {
            FileConfig::load(&path).map_err(|e| SensorError::Config(format!("{:#}", e)))?
        }
        Some((path, false)) if path.is_file() => {
            FileConfig::load(&path).map_err(|e| SensorError::Config(format!("{:#}", e)))?
        }
        Some((path, false)) => {
            debug!("No config file at {}, using defaults", path.display());
            FileConfig::default()
        }
        None => FileConfig::default(),
    };

    SensorConfig::resolve(cli, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SensorConfig::resolve(&Cli::default(), FileConfig::default()).unwrap();
        assert_eq!(config.precision, 1);
        assert_eq!(config.retries, 2);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert!(!config.accept_gdpr);
        assert!(config.server_id.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli {
            precision: Some(3),
            server_id: Some(7),
            ..Default::default()
        };
        let file = FileConfig {
            precision: Some(5),
            retries: Some(4),
            server_id: Some(99),
            accept_gdpr: Some(true),
            ..Default::default()
        };

        let config = SensorConfig::resolve(&cli, file).unwrap();
        assert_eq!(config.precision, 3);
        assert_eq!(config.server_id, Some(7));
        assert_eq!(config.retries, 4);
        assert!(config.accept_gdpr);
    }

    #[test]
    fn test_file_values_are_range_checked() {
        let file = FileConfig {
            retries: Some(9),
            ..Default::default()
        };
        let err = SensorConfig::resolve(&Cli::default(), file).unwrap_err();
        assert!(err.to_string().contains("retries must be between 0 and 4"));

        let file = FileConfig {
            precision: Some(12),
            ..Default::default()
        };
        assert!(SensorConfig::resolve(&Cli::default(), file).is_err());
    }

    #[test]
    fn test_log_file_implies_debug() {
        let cli = Cli {
            log_file: Some(PathBuf::from("/tmp/sensor.log")),
            ..Default::default()
        };
        let config = SensorConfig::resolve(&cli, FileConfig::default()).unwrap();
        assert!(config.debug);
    }

    #[test]
    fn test_file_log_file_implies_debug() {
        let file = FileConfig {
            log_file: Some(PathBuf::from("/tmp/sensor.log")),
            ..Default::default()
        };
        let config = SensorConfig::resolve(&Cli::default(), file).unwrap();
        assert!(config.debug);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/sensor.log")));
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "server_id = 4242\nprecision = 2\naccept_gdpr = true").unwrap();

        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        let config = load(&cli).unwrap();
        assert_eq!(config.server_id, Some(4242));
        assert_eq!(config.precision, 2);
        assert!(config.accept_gdpr);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        assert!(matches!(load(&cli), Err(SensorError::Config(_))));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "precison = 2\n").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }
}
