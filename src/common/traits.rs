//! Trait definitions for quote sources and the runner's collaborators

use super::errors::Result;
use super::types::{AlertClass, Mode, Quote};

/// Browser identity sent with every quote request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Common capability interface of a quote provider
///
/// Implementations are stateless: the resolved code list for the current
/// configuration is passed in by the caller, never cached on the source.
pub trait QuoteSource: Send + Sync {
    /// Short identifier used in logs and configuration
    fn name(&self) -> &'static str;

    /// Scheme and host requests go to unless overridden
    fn default_base(&self) -> &'static str;

    /// Referer the endpoint expects
    fn referer(&self) -> &'static str;

    /// Whether the source can serve [`Mode::Price`]
    fn supports_price(&self) -> bool;

    /// Build the request URL for the joined code list
    ///
    /// Cache-busting parameters are regenerated on every call.
    fn build_url(&self, base: &str, codes: &str, rng: &mut dyn RandomSource) -> String;

    /// Translate a configured code into this source's syntax
    fn convert_code(&self, code: &str, is_index: bool) -> Result<String>;

    /// Parse a raw body into one entry per requested code, in request order
    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>>;

    /// Request headers
    fn headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![("Referer", self.referer()), ("User-Agent", USER_AGENT)]
    }
}

/// Sink for desktop notifications
pub trait Notifier: Send + Sync {
    /// Show a list of short lines, optionally with one of the fixed images
    fn notify(&self, lines: &[String], image: Option<AlertClass>);
}

/// Randomness used for provider selection, cache busting and sleep jitter
pub trait RandomSource: Send {
    /// Index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;

    /// Value in `low..=high`
    fn between(&mut self, low: u64, high: u64) -> u64;
}
