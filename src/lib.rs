//! StockRunner Library
//!
//! Polls public stock-quote providers during trading hours, raises
//! threshold notifications and hands a JSON snapshot to a desktop widget.

pub mod common;
pub mod config;
pub mod engine;
pub mod providers;

// Re-export commonly used types
pub use common::errors::{Result, RunnerError};
pub use common::traits::{Notifier, QuoteSource, RandomSource};
pub use common::types::{AlertClass, Mode, Quote, QuoteValue, Retrieval, Snapshot};
pub use config::types::{RunnerConfig, RunnerPaths, ThresholdConfig, TradingWindow};
pub use engine::{Session, SessionExit, SessionState};
pub use providers::ProviderKind;
