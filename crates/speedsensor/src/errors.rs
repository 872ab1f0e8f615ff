//! Error codes and exit status for speedsensor
//!
//! Each fatal condition gets its own exit code so a monitoring agent can
//! tell "tool missing" from "network down" without parsing text.

use speedsensor_shared::SensorError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code for invalid configuration
pub const EXIT_CONFIG: i32 = 64;

/// Exit code when the speedtest executable cannot be found
pub const EXIT_EXECUTABLE_NOT_FOUND: i32 = 66;

/// Exit code when every attempt failed
pub const EXIT_RETRIES_EXHAUSTED: i32 = 69;

/// Exit code when the tool's result has an unexpected shape
pub const EXIT_UNEXPECTED_SHAPE: i32 = 70;

/// Exit code when the executable exists but could not be started
pub const EXIT_LAUNCH_FAILED: i32 = 71;

/// Exit code when the output file could not be written
pub const EXIT_OUTPUT_FAILED: i32 = 73;

pub fn exit_code(err: &SensorError) -> i32 {
    match err {
        SensorError::Config(_) => EXIT_CONFIG,
        SensorError::ExecutableNotFound { .. } => EXIT_EXECUTABLE_NOT_FOUND,
        SensorError::RetriesExhausted { .. } => EXIT_RETRIES_EXHAUSTED,
        SensorError::UnexpectedResultShape { .. } => EXIT_UNEXPECTED_SHAPE,
        SensorError::Launch { .. } => EXIT_LAUNCH_FAILED,
    }
}

/// Diagnostic line shown instead of the markup.
pub fn diagnostic(err: &SensorError) -> String {
    format!("Error: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds_have_distinct_codes() {
        let errors = [
            SensorError::Config("bad".to_string()),
            SensorError::ExecutableNotFound { searched: vec![] },
            SensorError::RetriesExhausted { attempts: 3 },
            SensorError::UnexpectedResultShape { missing: vec![] },
        ];
        let mut codes: Vec<i32> = errors.iter().map(exit_code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&EXIT_SUCCESS));
    }

    #[test]
    fn test_diagnostic_prefix() {
        let msg = diagnostic(&SensorError::RetriesExhausted { attempts: 1 });
        assert_eq!(msg, "Error: no successful measurement after 1 attempt(s)");
    }
}
