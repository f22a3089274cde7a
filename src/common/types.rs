//! Unified types shared by every quote provider

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::RunnerError;

/// Display name used by providers that do not return names
pub const NAME_PLACEHOLDER: &str = "?";

/// Snapshot representation of an unavailable value
pub const VALUE_PLACEHOLDER: &str = "-";

/// Which figure a retrieval asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Percent change against the previous close
    Percent,
    /// Today's price
    Price,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Percent => write!(f, "percent"),
            Mode::Price => write!(f, "price"),
        }
    }
}

impl FromStr for Mode {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percent" => Ok(Mode::Percent),
            "price" => Ok(Mode::Price),
            other => Err(RunnerError::Configuration(format!("unknown mode: {}", other))),
        }
    }
}

/// A single figure for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteValue {
    /// Percent change or price
    Number(Decimal),
    /// The provider cannot supply a figure for this code
    Unavailable,
    /// The provider covered the code but sent no value
    Missing,
}

impl std::fmt::Display for QuoteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteValue::Number(value) => write!(f, "{}", value.normalize()),
            QuoteValue::Unavailable => write!(f, "{}", VALUE_PLACEHOLDER),
            QuoteValue::Missing => write!(f, "null"),
        }
    }
}

impl Serialize for QuoteValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QuoteValue::Number(value) => match value.to_f64() {
                Some(float) => serializer.serialize_f64(float),
                None => serializer.serialize_str(&value.to_string()),
            },
            QuoteValue::Unavailable => serializer.serialize_str(VALUE_PLACEHOLDER),
            QuoteValue::Missing => serializer.serialize_none(),
        }
    }
}

/// One `[name, value]` entry of a series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Short display name
    pub name: String,
    pub value: QuoteValue,
}

impl Quote {
    pub fn new(name: impl Into<String>, value: QuoteValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Placeholder entry for a code the response did not cover
    pub fn unavailable() -> Self {
        Self::new(NAME_PLACEHOLDER, QuoteValue::Unavailable)
    }

    pub fn has_placeholder_name(&self) -> bool {
        self.name == NAME_PLACEHOLDER
    }
}

impl Serialize for Quote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.name)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

/// Outcome of one retrieval
///
/// Serializes either as the list of `[name, value]` pairs or as the bare
/// diagnostic string, which is what the widget keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Retrieval {
    Series(Vec<Quote>),
    Failure(String),
}

impl Retrieval {
    pub fn is_series(&self) -> bool {
        matches!(self, Retrieval::Series(_))
    }

    pub fn series(&self) -> Option<&[Quote]> {
        match self {
            Retrieval::Series(series) => Some(series),
            Retrieval::Failure(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Retrieval::Series(_) => None,
            Retrieval::Failure(msg) => Some(msg),
        }
    }
}

/// Image shown with a batch of threshold alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertClass {
    Up,
    Down,
    UpDown,
}

impl AlertClass {
    /// Aggregate class for the crossings seen in one tick
    pub fn from_crossings(up: bool, down: bool) -> Option<Self> {
        match (up, down) {
            (true, true) => Some(AlertClass::UpDown),
            (true, false) => Some(AlertClass::Up),
            (false, true) => Some(AlertClass::Down),
            (false, false) => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            AlertClass::Up => "up",
            AlertClass::Down => "down",
            AlertClass::UpDown => "updown",
        }
    }
}

impl std::fmt::Display for AlertClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// State persisted for the widget after every tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Slots that already crossed a threshold today
    pub notified: Vec<usize>,
    /// Latest series, or the diagnostic of a failed tick
    pub prices: Retrieval,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_series_serialization() {
        let prices = Retrieval::Series(vec![
            Quote::new("上证", QuoteValue::Number(dec!(0.39))),
            Quote::new("恒生", QuoteValue::Unavailable),
            Quote::new("茅台", QuoteValue::Missing),
        ]);
        let snapshot = Snapshot {
            notified: vec![1],
            prices,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"notified":[1],"prices":[["上证",0.39],["恒生","-"],["茅台",null]]}"#
        );
    }

    #[test]
    fn test_failure_serialization() {
        let snapshot = Snapshot {
            notified: vec![],
            prices: Retrieval::Failure("503".to_string()),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"notified":[],"prices":"503"}"#);
    }

    #[test]
    fn test_alert_class_aggregation() {
        assert_eq!(AlertClass::from_crossings(true, true), Some(AlertClass::UpDown));
        assert_eq!(AlertClass::from_crossings(true, false), Some(AlertClass::Up));
        assert_eq!(AlertClass::from_crossings(false, true), Some(AlertClass::Down));
        assert_eq!(AlertClass::from_crossings(false, false), None);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("price".parse::<Mode>().unwrap(), Mode::Price);
        assert_eq!("Percent".parse::<Mode>().unwrap(), Mode::Percent);
        assert!("volume".parse::<Mode>().is_err());
    }
}
