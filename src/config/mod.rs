//! Configuration loading and types

pub mod loader;
pub mod types;

pub use loader::{config_modified, load_config, resolve_home};
pub use types::{RunnerConfig, RunnerPaths, ThresholdConfig, TradingWindow};
