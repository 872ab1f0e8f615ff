//! Output sinks for the sensor payload.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Relative output paths are taken from the current directory.
pub fn resolve_output_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    Ok(cwd.join(path))
}

/// Write the payload to a file, replacing earlier contents.
pub fn write_file(payload: &str, path: &Path) -> Result<PathBuf> {
    let path = resolve_output_path(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    fs::write(&path, payload)
        .with_context(|| format!("cannot write output file {}", path.display()))?;
    info!("Wrote sensor output to {}", path.display());
    Ok(path)
}

/// Print the payload on `out`, and mirror it to `file` when given.
///
/// The console copy is written first so a file error never hides the
/// reading from the monitoring side.
pub fn emit<W: Write>(out: &mut W, payload: &str, file: Option<&Path>) -> Result<()> {
    writeln!(out, "{}", payload).context("cannot write to stdout")?;
    out.flush().context("cannot flush stdout")?;

    if let Some(path) = file {
        write_file(payload, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_console_only() {
        let mut buf = Vec::new();
        emit(&mut buf, "<SPEEDTEST/>", None).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "<SPEEDTEST/>\n");
    }

    #[test]
    fn test_emit_mirrors_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sensor.xml");
        let mut buf = Vec::new();

        emit(&mut buf, "payload", Some(&path)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "payload");
        assert_eq!(buf, b"payload\n");
    }

    #[test]
    fn test_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor.xml");
        fs::write(&path, "old and longer content").unwrap();

        write_file("new", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_relative_path_resolves_against_cwd() {
        let resolved = resolve_output_path(Path::new("sensor.xml")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("sensor.xml"));
    }
}
