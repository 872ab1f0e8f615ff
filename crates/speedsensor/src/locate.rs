//! Locating the speedtest executable.
//!
//! Order: explicit path, next to our own binary, then each `$PATH` entry.

use speedsensor_shared::SensorError;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Executable name, with `.exe` on Windows
pub fn speedtest_file_name() -> String {
    format!("speedtest{}", env::consts::EXE_SUFFIX)
}

/// Resolve the binary to run, or report every place that was checked.
pub fn find_speedtest(explicit: Option<&Path>) -> Result<PathBuf, SensorError> {
    let own_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    find_in(explicit, own_dir.as_deref(), env::var_os("PATH"))
}

fn find_in(
    explicit: Option<&Path>,
    own_dir: Option<&Path>,
    path_var: Option<OsString>,
) -> Result<PathBuf, SensorError> {
    let mut searched = Vec::new();

    // An explicit path is authoritative; no fallback search.
    if let Some(path) = explicit {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        searched.push(path.to_path_buf());
        return Err(SensorError::ExecutableNotFound { searched });
    }

    let name = speedtest_file_name();

    if let Some(dir) = own_dir {
        let candidate = dir.join(&name);
        if is_executable(&candidate) {
            debug!("Using speedtest next to sensor: {}", candidate.display());
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    if let Some(path_var) = path_var {
        for dir in env::split_paths(&path_var) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            let candidate = dir.join(&name);
            if is_executable(&candidate) {
                debug!("Using speedtest from PATH: {}", candidate.display());
                return Ok(candidate);
            }
            searched.push(candidate);
        }
    }

    Err(SensorError::ExecutableNotFound { searched })
}

/// Check if a file is executable
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
