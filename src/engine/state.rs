//! Immutable per-configuration session state
//!
//! A [`SessionState`] is built once per successful configuration load and
//! shared behind an `Arc`. Reloads replace the whole value; nothing in it is
//! mutated afterwards.

use tracing::{debug, warn};

use crate::common::errors::{Result, RunnerError};
use crate::common::types::Mode;
use crate::config::types::RunnerConfig;
use crate::providers::ProviderKind;

/// Provider codes resolved for the current configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub kind: ProviderKind,
    /// Provider-specific codes, indices first then equities
    pub codes: Vec<String>,
    /// `codes` joined with commas
    pub codes_str: String,
}

impl ResolvedProvider {
    /// Translate every configured code for `kind`
    pub fn resolve(kind: ProviderKind, config: &RunnerConfig) -> Result<Self> {
        let source = kind.source();
        let indices = config
            .indices
            .iter()
            .map(|code| source.convert_code(code, true));
        let equities = config
            .codes
            .iter()
            .map(|code| source.convert_code(code, false));
        let codes = indices.chain(equities).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            kind,
            codes_str: codes.join(","),
            codes,
        })
    }
}

/// Configuration plus the provider code lists derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub config: RunnerConfig,
    /// Usable providers in registry order
    pub providers: Vec<ResolvedProvider>,
}

impl SessionState {
    /// Resolve every provider; providers that cannot translate a code are left out
    pub fn resolve(config: RunnerConfig) -> Result<Self> {
        let mut providers = Vec::with_capacity(ProviderKind::ALL.len());
        for kind in ProviderKind::ALL {
            match ResolvedProvider::resolve(kind, &config) {
                Ok(resolved) => {
                    debug!("Provider {} codes: {}", kind, resolved.codes_str);
                    providers.push(resolved);
                }
                Err(e) => warn!("Provider {} disabled until next reload: {}", kind, e),
            }
        }

        if providers.is_empty() {
            return Err(RunnerError::Configuration(
                "no provider can serve the configured codes".to_string(),
            ));
        }

        Ok(Self { config, providers })
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ResolvedProvider> {
        self.providers.iter().find(|p| p.kind == kind)
    }

    /// Providers able to serve `mode`
    pub fn candidates(&self, mode: Mode) -> Vec<ProviderKind> {
        self.providers
            .iter()
            .map(|p| p.kind)
            .filter(|kind| mode == Mode::Percent || kind.source().supports_price())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::types::{ThresholdConfig, TradingWindow};
    use chrono::NaiveTime;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    pub(crate) fn config(indices: &[&str], codes: &[&str]) -> RunnerConfig {
        RunnerConfig {
            indices: indices.iter().map(|s| s.to_string()).collect(),
            codes: codes.iter().map(|s| s.to_string()).collect(),
            threshold: ThresholdConfig {
                indices: indices.iter().map(|_| dec!(1)).collect(),
                up: dec!(1),
                down: dec!(1),
            },
            rest_dates: vec![],
            delay: 10,
            sessions: vec![TradingWindow::new(
                NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            )],
            endpoints: HashMap::new(),
            alert_command: None,
        }
    }

    #[test]
    fn test_resolve_all_providers() {
        let state = SessionState::resolve(config(&["000001"], &["600519"])).unwrap();
        assert_eq!(state.providers.len(), ProviderKind::ALL.len());

        let east = state.provider(ProviderKind::East).unwrap();
        assert_eq!(east.codes, vec!["1.000001", "1.600519"]);
        assert_eq!(east.codes_str, "1.000001,1.600519");
    }

    #[test]
    fn test_unknown_mnemonic_disables_only_that_provider() {
        let state = SessionState::resolve(config(&["HSI"], &["600519"])).unwrap();
        assert!(state.provider(ProviderKind::Sohu).is_none());
        assert!(state.provider(ProviderKind::Qq).is_some());
        assert_eq!(state.providers.len(), ProviderKind::ALL.len() - 1);
    }

    #[test]
    fn test_no_usable_provider() {
        assert!(SessionState::resolve(config(&["N225"], &[])).is_err());
    }

    #[test]
    fn test_price_candidates_exclude_percent_only() {
        let state = SessionState::resolve(config(&["000001"], &[])).unwrap();
        assert!(state.candidates(Mode::Percent).contains(&ProviderKind::Cls));
        assert!(!state.candidates(Mode::Price).contains(&ProviderKind::Cls));
    }
}
