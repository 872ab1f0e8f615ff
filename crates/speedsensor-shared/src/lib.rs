//! Shared core for speedsensor: result model, retry controller,
//! normalization into sensor channels and markup rendering.

pub mod error;
pub mod measurement;
pub mod normalize;
pub mod render;
pub mod retry;

pub use error::{AttemptFailure, SensorError};
pub use measurement::{classify_output, MeasurementResult};
pub use normalize::{normalize, Channel, OutputRow};
pub use render::render_rows;
pub use retry::{run_with_retry, AttemptObserver, RetryOutcome, RetryPolicy, Sleeper};
