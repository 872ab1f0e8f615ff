//! speedsensor - speedtest sensor for monitoring systems
//!
//! Runs the speedtest CLI, retries failed measurements and prints the
//! sensor channel markup on stdout.

use clap::Parser;
use speedsensor::cli::Cli;
use speedsensor::{config, errors, logging, output, run};
use speedsensor_shared::SensorError;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load(&cli) {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    match logging::init(&config) {
        Ok(Some(path)) => info!("Debug log: {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Debug log disabled: {:#}", e),
    }

    info!("speedsensor v{} starting", env!("SPEEDSENSOR_VERSION"));

    let payload = match run::execute(&config) {
        Ok(payload) => payload,
        Err(e) => return fail(&e),
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = output::emit(&mut stdout, &payload, config.output_file.as_deref()) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        return exit(errors::EXIT_OUTPUT_FAILED);
    }

    exit(errors::EXIT_SUCCESS)
}

fn fail(err: &SensorError) -> ExitCode {
    warn!(code = err.code(), "{}", err);
    println!("{}", errors::diagnostic(err));
    exit(errors::exit_code(err))
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(errors::EXIT_GENERAL_ERROR as u8))
}
