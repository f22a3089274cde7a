//! Configuration loader

use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::types::RunnerConfig;
use crate::common::errors::{Result, RunnerError};

/// Environment variable naming the runner's home folder
pub const HOME_ENV: &str = "STOCK_RUNNER_HOME";

/// Load and validate the configuration file
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with STOCK_RUNNER, `__` separated)
/// 2. The JSON configuration file
/// 3. Default values
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    debug!("Loading configuration from {}", path.display());

    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Json).required(true))
        .add_source(
            Environment::with_prefix("STOCK_RUNNER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| RunnerError::Configuration(e.to_string()))?;

    let config: RunnerConfig = settings
        .try_deserialize()
        .map_err(|e| RunnerError::Configuration(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

/// Modification time of the configuration file, if readable
pub fn config_modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Resolve the runner's home folder
///
/// An explicit path wins, then `STOCK_RUNNER_HOME` (a `.env` file is
/// honoured), then `~/.stock`.
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = explicit {
        return Ok(home);
    }

    dotenvy::dotenv().ok();
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }

    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|user| PathBuf::from(user).join(".stock"))
        .ok_or_else(|| RunnerError::Configuration("cannot determine home folder".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"{
                "indices": ["000001", "HSI"],
                "codes": ["600519", "000858"],
                "threshold": {"indices": [1, 1.5], "up": 3, "down": 2.5},
                "rest_dates": ["2025-10-01"],
                "delay": 8
            }"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.indices, vec!["000001", "HSI"]);
        assert_eq!(config.threshold.indices, vec![dec!(1), dec!(1.5)]);
        assert_eq!(config.threshold.down, dec!(2.5));
        assert_eq!(config.delay, 8);
        assert_eq!(config.sessions.len(), 2);
    }

    #[test]
    fn test_load_mismatched_thresholds() {
        let file = write_config(
            r#"{
                "indices": ["000001"],
                "codes": [],
                "threshold": {"indices": [], "up": 3, "down": 3}
            }"#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(RunnerError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_malformed_json() {
        let file = write_config("{ not json");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_explicit_home_wins() {
        let home = resolve_home(Some(PathBuf::from("/srv/stock"))).unwrap();
        assert_eq!(home, PathBuf::from("/srv/stock"));
    }
}
