//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Every option is optional here so
//! the config file can supply it; defaults are applied in `config`.

use clap::Parser;
use std::path::PathBuf;

/// Speedtest sensor for monitoring systems
#[derive(Parser, Debug, Default)]
#[command(name = "speedsensor")]
#[command(about = "Runs the speedtest CLI and prints sensor channel markup", long_about = None)]
#[command(version = env!("SPEEDSENSOR_VERSION"))]
pub struct Cli {
    /// Speedtest server id to test against (default: tool picks the closest)
    #[arg(long)]
    pub server_id: Option<u32>,

    /// Also write the markup to this file
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Decimal places for reported values (0-8, default 1)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=8))]
    pub precision: Option<u8>,

    /// Retries after a failed attempt (0-4, default 2)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub retries: Option<u8>,

    /// Accept the GDPR notice on behalf of the user
    #[arg(long)]
    pub accept_gdpr: bool,

    /// Path to the speedtest executable (overrides lookup)
    #[arg(long, value_name = "PATH")]
    pub speedtest_path: Option<PathBuf>,

    /// Config file (overrides $SPEEDSENSOR_CONFIG and the XDG default)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write a debug log file
    #[arg(long)]
    pub debug: bool,

    /// Debug log location (implies --debug)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Seconds to wait between attempts (hidden - for testing)
    #[arg(long, hide = true)]
    pub retry_delay_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_all_options() {
        let cli = Cli::try_parse_from([
            "speedsensor",
            "--server-id",
            "4242",
            "--output-file",
            "out.xml",
            "--precision",
            "3",
            "--retries",
            "0",
            "--accept-gdpr",
        ])
        .unwrap();

        assert_eq!(cli.server_id, Some(4242));
        assert_eq!(cli.output_file, Some(PathBuf::from("out.xml")));
        assert_eq!(cli.precision, Some(3));
        assert_eq!(cli.retries, Some(0));
        assert!(cli.accept_gdpr);
        assert!(!cli.debug);
    }

    #[test]
    fn test_precision_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["speedsensor", "--precision", "9"]).is_err());
    }

    #[test]
    fn test_retries_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["speedsensor", "--retries", "5"]).is_err());
    }

    #[test]
    fn test_no_args_is_valid() {
        let cli = Cli::try_parse_from(["speedsensor"]).unwrap();
        assert!(cli.precision.is_none());
        assert!(cli.server_id.is_none());
    }
}
