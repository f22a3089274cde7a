//! Quote providers
//!
//! Every provider is a stateless unit struct implementing [`QuoteSource`].
//! [`ProviderKind`] enumerates the closed set and dispatches to them.

pub mod cls;
pub mod codes;
pub mod east;
pub mod qq;
pub mod sina;
pub mod sohu;
pub mod xq;

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use crate::common::errors::{Result, RunnerError};
use crate::common::traits::QuoteSource;
use crate::common::types::{Quote, QuoteValue, VALUE_PLACEHOLDER};

/// The fixed set of quote providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    East,
    Qq,
    Sina,
    Xq,
    Cls,
    Sohu,
}

impl ProviderKind {
    /// Registry order
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::East,
        ProviderKind::Qq,
        ProviderKind::Sina,
        ProviderKind::Xq,
        ProviderKind::Cls,
        ProviderKind::Sohu,
    ];

    /// Serves both modes with real names; used for the first tick
    pub const REFERENCE: ProviderKind = ProviderKind::East;

    pub fn source(self) -> &'static dyn QuoteSource {
        match self {
            ProviderKind::East => &east::East,
            ProviderKind::Qq => &qq::Qq,
            ProviderKind::Sina => &sina::Sina,
            ProviderKind::Xq => &xq::Xq,
            ProviderKind::Cls => &cls::Cls,
            ProviderKind::Sohu => &sohu::Sohu,
        }
    }

    pub fn name(self) -> &'static str {
        self.source().name()
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| RunnerError::Configuration(format!("unknown provider: {}", s)))
    }
}

/// Short display form: whitespace removed, first two characters
pub(crate) fn display_name(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).take(2).collect()
}

pub(crate) fn parse_decimal(field: &str) -> Result<Decimal> {
    let field = field.trim();
    Decimal::from_str(field)
        .or_else(|_| Decimal::from_scientific(field))
        .map_err(|e| RunnerError::parse(format!("invalid number {:?}: {}", field, e)))
}

/// Numeric text where `-` or an empty field means no figure
pub(crate) fn text_value(field: &str) -> Result<QuoteValue> {
    let field = field.trim();
    if field.is_empty() || field == VALUE_PLACEHOLDER {
        return Ok(QuoteValue::Unavailable);
    }
    parse_decimal(field).map(QuoteValue::Number)
}

/// JSON field value: numbers and numeric strings, `null` is a missing value
pub(crate) fn json_value(value: &Value) -> Result<QuoteValue> {
    match value {
        Value::Null => Ok(QuoteValue::Missing),
        Value::Number(number) => parse_decimal(&number.to_string()).map(QuoteValue::Number),
        Value::String(text) => text_value(text),
        other => Err(RunnerError::parse(format!("unexpected value {}", other))),
    }
}

/// Payload of a padded-JSON body, between the first `open` and the last `close`
pub(crate) fn unwrap_padding(body: &str, open: char, close: char) -> Result<&str> {
    let start = body
        .find(open)
        .ok_or_else(|| RunnerError::parse("missing JSONP opening"))?;
    let end = body
        .rfind(close)
        .filter(|end| *end > start)
        .ok_or_else(|| RunnerError::parse("missing JSONP closing"))?;
    Ok(&body[start + open.len_utf8()..end])
}

/// Right-hand side of a `key="payload";` assignment line
pub(crate) fn split_assignment(line: &str) -> Result<(&str, &str)> {
    let (key, payload) = line
        .split_once('=')
        .ok_or_else(|| RunnerError::parse(format!("not an assignment: {}", line)))?;
    let payload = payload.trim().trim_end_matches(';').trim_matches('"');
    Ok((key.trim(), payload))
}

/// Order entries keyed by provider code back into request order
///
/// Codes the response did not cover become unavailable.
pub(crate) fn rejoin(codes: &[String], mut entries: HashMap<String, Quote>) -> Vec<Quote> {
    codes
        .iter()
        .map(|code| entries.remove(code).unwrap_or_else(Quote::unavailable))
        .collect()
}
