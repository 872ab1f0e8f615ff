//! Speedtest process invocation.
//!
//! Runs the tool once and hands back stdout and stderr merged into one
//! string. The exit status is logged but not interpreted; the text decides
//! whether the attempt worked.

use crate::config::SensorConfig;
use speedsensor_shared::SensorError;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use tracing::debug;

/// One configured speedtest command line.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedtestCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl SpeedtestCommand {
    pub fn new(program: PathBuf, config: &SensorConfig) -> Self {
        Self {
            program,
            args: build_args(config),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Execute once, blocking until the tool exits.
    pub fn run(&self) -> Result<String, SensorError> {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| SensorError::Launch {
                path: self.program.clone(),
                source,
            })?;

        debug!(
            "speedtest exited with {:?} after {} ms",
            output.status.code(),
            start.elapsed().as_millis()
        );

        Ok(merge_output(&output.stdout, &output.stderr))
    }
}

/// Flags passed on every run.
fn build_args(config: &SensorConfig) -> Vec<String> {
    let mut args = vec![
        "--format=json".to_string(),
        format!("--precision={}", config.precision),
        "--accept-license".to_string(),
    ];
    if config.accept_gdpr {
        args.push("--accept-gdpr".to_string());
    }
    if let Some(id) = config.server_id {
        args.push(format!("--server-id={}", id));
    }
    args
}

fn merge_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let cmd = SpeedtestCommand::new("speedtest".into(), &SensorConfig::default());
        assert_eq!(
            cmd.args(),
            &["--format=json", "--precision=1", "--accept-license"]
        );
    }

    #[test]
    fn test_optional_flags() {
        let config = SensorConfig {
            precision: 4,
            accept_gdpr: true,
            server_id: Some(2345),
            ..Default::default()
        };
        let cmd = SpeedtestCommand::new("speedtest".into(), &config);
        assert_eq!(
            cmd.args(),
            &[
                "--format=json",
                "--precision=4",
                "--accept-license",
                "--accept-gdpr",
                "--server-id=2345"
            ]
        );
    }

    #[test]
    fn test_merge_output_appends_stderr_on_new_line() {
        assert_eq!(merge_output(b"{\"a\":1}", b"warn\n"), "{\"a\":1}\nwarn\n");
        assert_eq!(merge_output(b"out\n", b""), "out\n");
        assert_eq!(merge_output(b"", b"only err"), "only err");
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let cmd = SpeedtestCommand::new(
            "/nonexistent/speedtest-xyz".into(),
            &SensorConfig::default(),
        );
        assert!(matches!(cmd.run(), Err(SensorError::Launch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_both_streams() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("speedtest");
        std::fs::write(&script, "#!/bin/sh\necho \"$1\"\necho oops >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cmd = SpeedtestCommand::new(script, &SensorConfig::default());
        let text = cmd.run().unwrap();
        assert_eq!(text, "--format=json\noops\n");
    }
}
