//! Provider selection and the single-request retrieval cycle

use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::state::SessionState;
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::RandomSource;
use crate::common::types::{Mode, Retrieval};
use crate::providers::ProviderKind;

/// Chooses the provider for each tick
///
/// The first pick of a session goes to [`ProviderKind::REFERENCE`] because
/// its names seed the display-name cache. Later picks are uniform over the
/// providers able to serve the requested mode.
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    first_tick: bool,
}

impl ProviderSelector {
    pub fn new() -> Self {
        Self { first_tick: true }
    }

    /// Selector that never forces the reference provider
    pub fn random_only() -> Self {
        Self { first_tick: false }
    }

    /// Force the reference provider on the next pick again
    pub fn rearm(&mut self) {
        self.first_tick = true;
    }

    pub fn select(
        &mut self,
        state: &SessionState,
        mode: Mode,
        rng: &mut dyn RandomSource,
    ) -> Option<ProviderKind> {
        if std::mem::take(&mut self.first_tick)
            && state.provider(ProviderKind::REFERENCE).is_some()
        {
            return Some(ProviderKind::REFERENCE);
        }

        let candidates = state.candidates(mode);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.pick(candidates.len())])
    }
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues the HTTP request of one tick and classifies the outcome
///
/// Every failure comes back as [`Retrieval::Failure`]; nothing here returns
/// an error to the session loop.
#[derive(Debug, Clone)]
pub struct Retriever {
    client: Client,
}

impl Retriever {
    /// Create a retriever with a fresh HTTP client
    ///
    /// Timeouts are applied per request from the current configuration.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| RunnerError::Internal(e.to_string()))?;
        Ok(Self { client })
    }

    /// Run one retrieval against `kind`
    #[instrument(skip(self, state, rng), fields(provider = %kind))]
    pub async fn retrieve(
        &self,
        state: &SessionState,
        kind: ProviderKind,
        mode: Mode,
        rng: &mut dyn RandomSource,
    ) -> Retrieval {
        let Some(resolved) = state.provider(kind) else {
            return Retrieval::Failure(format!("Provider {} is not usable", kind));
        };

        let source = kind.source();
        let base = state.config.endpoint(kind).unwrap_or(source.default_base());
        let url = source.build_url(base, &resolved.codes_str, rng);
        debug!("Retrieve from: {}", url);

        let started = Instant::now();
        let mut request = self
            .client
            .get(&url)
            .timeout(state.config.request_timeout());
        for (name, value) in source.headers() {
            request = request.header(name, value);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(&url, e, started.elapsed()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Failed to retrieve from ({}): {}", url, status.as_u16());
            return Retrieval::Failure(status.as_u16().to_string());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return transport_failure(&url, e, started.elapsed()),
        };

        match source.parse_response(&body, &resolved.codes, mode) {
            Ok(series) => Retrieval::Series(series),
            Err(e) => {
                let msg = format!("Failed to parse response from {}: {}", url, e);
                warn!("{}", msg);
                Retrieval::Failure(msg)
            }
        }
    }
}

fn transport_failure(url: &str, err: reqwest::Error, elapsed: Duration) -> Retrieval {
    if err.is_timeout() {
        let msg = format!(
            "Request to {} timed out after {:.1}s",
            url,
            elapsed.as_secs_f64()
        );
        warn!("{}", msg);
        return Retrieval::Failure(msg);
    }

    let err = RunnerError::Transport(err);
    warn!("Failed to retrieve from {}: {}", url, err);
    Retrieval::Failure(err.to_string())
}
