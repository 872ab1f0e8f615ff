//! One sensor run: locate the tool, measure with retry, normalize, render.

use crate::config::SensorConfig;
use crate::invoke::SpeedtestCommand;
use crate::locate;
use speedsensor_shared::measurement::MeasurementResult;
use speedsensor_shared::retry::{ThreadSleeper, TracingObserver};
use speedsensor_shared::{
    normalize, render_rows, run_with_retry, AttemptObserver, SensorError, Sleeper,
};
use tracing::info;

/// Produce the sensor payload using the real process and clock.
pub fn execute(config: &SensorConfig) -> Result<String, SensorError> {
    let program = locate::find_speedtest(config.speedtest_path.as_deref())?;
    info!("Using speedtest at {}", program.display());

    let command = SpeedtestCommand::new(program, config);
    execute_with(config, || command.run(), &mut ThreadSleeper, &mut TracingObserver)
}

/// Same as `execute` with the collaborators supplied by the caller.
pub fn execute_with<F>(
    config: &SensorConfig,
    invoke: F,
    sleeper: &mut dyn Sleeper,
    observer: &mut dyn AttemptObserver,
) -> Result<String, SensorError>
where
    F: FnMut() -> Result<String, SensorError>,
{
    let policy = config.retry_policy()?;
    let outcome = run_with_retry(invoke, &policy, sleeper, observer)?;
    log_summary(&outcome.result, outcome.attempts);

    let rows = normalize(&outcome.result, config.precision)?;
    Ok(render_rows(&rows, config.precision))
}

/// Context that never reaches the markup but helps when reading the log.
fn log_summary(result: &MeasurementResult, attempts: u32) {
    let server = result.server.as_ref();
    let interface = result.interface.as_ref();

    info!(
        attempts,
        isp = result.isp.as_deref().unwrap_or("unknown"),
        server_id = server.and_then(|s| s.id),
        server_host = server.and_then(|s| s.host.as_deref()),
        server_ip = server.and_then(|s| s.ip.as_deref()),
        internal_ip = interface.and_then(|i| i.internal_ip.as_deref()),
        external_ip = interface.and_then(|i| i.external_ip.as_deref()),
        vpn = interface.and_then(|i| i.is_vpn),
        "Measurement complete"
    );

    if let Some(url) = result.result.as_ref().and_then(|r| r.url.as_deref()) {
        info!("Result page: {}", url);
    }
}
