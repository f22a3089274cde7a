//! Configuration types

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::errors::{Result, RunnerError};
use crate::providers::ProviderKind;

/// Runner configuration as read from `stock.cfg.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Index codes, numeric or a known mnemonic such as `HSI`
    #[serde(default)]
    pub indices: Vec<String>,
    /// Equity codes, numeric only
    #[serde(default)]
    pub codes: Vec<String>,
    /// Notification thresholds
    pub threshold: ThresholdConfig,
    /// Non-trading dates (`YYYY-MM-DD`) in addition to weekends
    #[serde(default)]
    pub rest_dates: Vec<String>,
    /// Request timeout and inter-tick sleep in seconds
    #[serde(default = "default_delay")]
    pub delay: u64,
    /// Trading session windows, local time
    #[serde(default = "default_sessions")]
    pub sessions: Vec<TradingWindow>,
    /// Base URL overrides keyed by provider name
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
    /// External program that renders notifications
    #[serde(default)]
    pub alert_command: Option<String>,
}

/// Percent-change thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// One threshold per configured index, same order
    #[serde(default)]
    pub indices: Vec<Decimal>,
    /// Equity threshold for rises
    pub up: Decimal,
    /// Equity threshold for falls
    pub down: Decimal,
}

/// A `[start, end]` window of local wall-clock time, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    #[serde(with = "clock_time")]
    pub start: NaiveTime,
    #[serde(with = "clock_time")]
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }
}

fn default_delay() -> u64 {
    10
}

fn default_sessions() -> Vec<TradingWindow> {
    let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
    vec![
        TradingWindow::new(at(9, 15), at(11, 30)),
        TradingWindow::new(at(13, 0), at(16, 0)),
    ]
}

impl RunnerConfig {
    /// Check the shape of a freshly deserialized configuration
    pub fn validate(&self) -> Result<()> {
        if self.threshold.indices.len() != self.indices.len() {
            return Err(RunnerError::Configuration(format!(
                "Indices and thresholds mismatch: {} indices, {} thresholds",
                self.indices.len(),
                self.threshold.indices.len()
            )));
        }

        if self.indices.is_empty() && self.codes.is_empty() {
            return Err(RunnerError::Configuration(
                "No indices and codes configured".to_string(),
            ));
        }

        if let Some(code) = self.codes.iter().find(|c| !is_numeric_code(c)) {
            return Err(RunnerError::Configuration(format!(
                "Equity code must be numeric: {}",
                code
            )));
        }

        if self.delay == 0 {
            return Err(RunnerError::Configuration(
                "delay must be at least 1 second".to_string(),
            ));
        }

        if self.sessions.is_empty() {
            return Err(RunnerError::Configuration(
                "At least one trading session is required".to_string(),
            ));
        }
        if let Some(window) = self.sessions.iter().find(|w| w.start > w.end) {
            return Err(RunnerError::Configuration(format!(
                "Trading session ends before it starts: {}-{}",
                window.start, window.end
            )));
        }

        for date in &self.rest_dates {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                RunnerError::Configuration(format!("Invalid rest date {}: {}", date, e))
            })?;
        }

        for (name, base) in &self.endpoints {
            name.parse::<ProviderKind>()?;
            url::Url::parse(base).map_err(|e| {
                RunnerError::Configuration(format!("Invalid endpoint for {}: {}", name, e))
            })?;
        }

        Ok(())
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    /// Base URL override for a provider
    pub fn endpoint(&self, kind: ProviderKind) -> Option<&str> {
        self.endpoints.get(kind.name()).map(String::as_str)
    }

    /// Number of series slots
    pub fn slot_count(&self) -> usize {
        self.indices.len() + self.codes.len()
    }
}

pub(crate) fn is_numeric_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

/// Well-known files under the runner's home folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerPaths {
    pub home: PathBuf,
    pub config_file: PathBuf,
    pub data_file: PathBuf,
    pub lock_file: PathBuf,
    pub log_file: PathBuf,
}

impl RunnerPaths {
    /// Standard layout under `home`
    pub fn under(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref().to_path_buf();
        Self {
            config_file: home.join("cfg").join("stock.cfg.json"),
            data_file: home.join("stock.dat.json"),
            lock_file: home.join("stock.dat.lock"),
            log_file: home.join("stock.log"),
            home,
        }
    }

    /// Read the configuration from a non-standard location
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }
}

/// `HH:MM` (or `HH:MM:SS`) serde format for session windows
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time {}: {}", raw, e)))
    }
}
