//! Bounded retry around the speedtest invocation.
//!
//! Attempts run strictly one after another: the tool saturates the local
//! link, so overlapping runs would skew each other's readings.

use crate::error::{AttemptFailure, SensorError};
use crate::measurement::{classify_output, MeasurementResult};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between a failed attempt and the next one.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u8 = 2;

/// Upper bound for configured retries.
pub const MAX_RETRIES: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u8,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u8, delay: Duration) -> Result<Self, SensorError> {
        if max_retries > MAX_RETRIES {
            return Err(SensorError::Config(format!(
                "retries {} is outside 0..={}",
                max_retries, MAX_RETRIES
            )));
        }
        Ok(Self { max_retries, delay })
    }

    /// First attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        u32::from(self.max_retries) + 1
    }
}

/// Clock seam so tests can count pauses instead of waiting.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Receives per-attempt diagnostics. Nothing here affects control flow.
pub trait AttemptObserver {
    fn attempt_started(&mut self, _attempt: u32, _max_attempts: u32) {}
    fn attempt_output(&mut self, _attempt: u32, _raw: &str) {}
    fn attempt_failed(&mut self, _attempt: u32, _failure: &AttemptFailure, _will_retry: bool) {}
    fn attempt_succeeded(&mut self, _attempt: u32) {}
}

/// Default observer: forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn attempt_started(&mut self, attempt: u32, max_attempts: u32) {
        info!("Running speedtest (attempt {}/{})", attempt, max_attempts);
    }

    fn attempt_output(&mut self, attempt: u32, raw: &str) {
        debug!(attempt, "Raw speedtest output: {}", raw.trim_end());
    }

    fn attempt_failed(&mut self, attempt: u32, failure: &AttemptFailure, will_retry: bool) {
        if will_retry {
            warn!("Attempt {} failed: {} - retrying", attempt, failure);
        } else {
            warn!("Attempt {} failed: {} - no attempts left", attempt, failure);
        }
    }

    fn attempt_succeeded(&mut self, attempt: u32) {
        info!("Speedtest succeeded on attempt {}", attempt);
    }
}

/// Bookkeeping for one run.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempts_made: u32,
    max_attempts: u32,
    succeeded: bool,
    last_result: Option<MeasurementResult>,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts_made: 0,
            max_attempts: policy.max_attempts(),
            succeeded: false,
            last_result: None,
        }
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn has_attempts_left(&self) -> bool {
        !self.succeeded && self.attempts_made < self.max_attempts
    }

    fn begin_attempt(&mut self) -> u32 {
        self.attempts_made += 1;
        self.attempts_made
    }

    fn record(&mut self, outcome: Result<MeasurementResult, AttemptFailure>) {
        if let Ok(result) = outcome {
            self.succeeded = true;
            self.last_result = Some(result);
        }
    }

    fn into_outcome(self) -> Result<RetryOutcome, SensorError> {
        match (self.succeeded, self.last_result) {
            (true, Some(result)) => Ok(RetryOutcome {
                result,
                attempts: self.attempts_made,
            }),
            _ => Err(SensorError::RetriesExhausted {
                attempts: self.attempts_made,
            }),
        }
    }
}

/// Successful run: the record plus how many attempts it took.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub result: MeasurementResult,
    pub attempts: u32,
}

/// Run `invoke` until it yields a `result` record or attempts run out.
///
/// `invoke` returns the merged output text. It errs only when the process
/// could not be started, which aborts the run without retrying.
pub fn run_with_retry<F>(
    mut invoke: F,
    policy: &RetryPolicy,
    sleeper: &mut dyn Sleeper,
    observer: &mut dyn AttemptObserver,
) -> Result<RetryOutcome, SensorError>
where
    F: FnMut() -> Result<String, SensorError>,
{
    let mut state = RetryState::new(policy);

    while state.has_attempts_left() {
        let attempt = state.begin_attempt();
        observer.attempt_started(attempt, state.max_attempts());

        let raw = invoke()?;
        observer.attempt_output(attempt, &raw);

        let outcome = classify_output(&raw);
        match &outcome {
            Ok(_) => observer.attempt_succeeded(attempt),
            Err(failure) => {
                let will_retry = attempt < state.max_attempts();
                observer.attempt_failed(attempt, failure, will_retry);
            }
        }
        state.record(outcome);

        if state.has_attempts_left() {
            sleeper.sleep(policy.delay);
        }
    }

    state.into_outcome()
}
