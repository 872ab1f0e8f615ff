//! speedsensor library - exposes modules for testing

pub mod cli;
pub mod config;
pub mod errors;
pub mod invoke;
pub mod locate;
pub mod logging;
pub mod output;
pub mod run;
