//! Xueqiu `quotec.json` endpoint
//!
//! JSON `{"data": [{"symbol": .., "current": .., "percent": ..}]}` keyed by
//! symbol. No names are returned.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::codes::{CodeSyntax, ExchangeAffixes, HIGH_BREAKPOINT, LOW_BREAKPOINT};
use super::{json_value, rejoin};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{QuoteSource, RandomSource};
use crate::common::types::{Mode, Quote, NAME_PLACEHOLDER};

const SYNTAX: CodeSyntax = CodeSyntax {
    breakpoints: (LOW_BREAKPOINT, HIGH_BREAKPOINT),
    equities: ExchangeAffixes::prefixes("SZ", "SH", "BJ"),
    indices: ExchangeAffixes::prefixes("SZ", "SH", "BJ"),
    mnemonics: &[("HSI", "HK")],
};

#[derive(Debug, Deserialize)]
struct QuotecResponse {
    data: Option<Vec<QuotecItem>>,
}

#[derive(Debug, Deserialize)]
struct QuotecItem {
    symbol: String,
    #[serde(default)]
    current: Value,
    #[serde(default)]
    percent: Value,
}

/// Xueqiu quote source
#[derive(Debug, Clone, Copy, Default)]
pub struct Xq;

impl QuoteSource for Xq {
    fn name(&self) -> &'static str {
        "xq"
    }

    fn default_base(&self) -> &'static str {
        "https://stock.xueqiu.com"
    }

    fn referer(&self) -> &'static str {
        "https://xueqiu.com/"
    }

    fn supports_price(&self) -> bool {
        true
    }

    fn build_url(&self, base: &str, codes: &str, _rng: &mut dyn RandomSource) -> String {
        format!(
            "{}/v5/stock/realtime/quotec.json?symbol={}",
            base.trim_end_matches('/'),
            codes
        )
    }

    fn convert_code(&self, code: &str, is_index: bool) -> Result<String> {
        SYNTAX.convert(self.name(), code, is_index)
    }

    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>> {
        let response: QuotecResponse = serde_json::from_str(body)?;
        let items = response
            .data
            .ok_or_else(|| RunnerError::parse("response carries no data"))?;

        let mut entries = HashMap::with_capacity(items.len());
        for item in items {
            let value = match mode {
                Mode::Price => json_value(&item.current)?,
                Mode::Percent => json_value(&item.percent)?,
            };
            entries.insert(item.symbol, Quote::new(NAME_PLACEHOLDER, value));
        }

        Ok(rejoin(codes, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::QuoteValue;
    use rust_decimal_macros::dec;

    const BODY: &str = r#"{"data":[
        {"symbol":"SH600519","current":1688.0,"percent":2.05},
        {"symbol":"HKHSI","current":20001.5,"percent":null},
        {"symbol":"SH000001","current":3250.12,"percent":0.39}
    ],"error_code":0,"error_description":null}"#;

    fn codes() -> Vec<String> {
        vec!["SH000001".to_string(), "HKHSI".to_string(), "SH600519".to_string()]
    }

    #[test]
    fn test_convert_code() {
        assert_eq!(Xq.convert_code("000001", true).unwrap(), "SH000001");
        assert_eq!(Xq.convert_code("HSI", true).unwrap(), "HKHSI");
        assert_eq!(Xq.convert_code("000858", false).unwrap(), "SZ000858");
    }

    #[test]
    fn test_parse_rejoins_by_symbol() {
        let series = Xq.parse_response(BODY, &codes(), Mode::Percent).unwrap();
        assert_eq!(
            series,
            vec![
                Quote::new(NAME_PLACEHOLDER, QuoteValue::Number(dec!(0.39))),
                Quote::new(NAME_PLACEHOLDER, QuoteValue::Missing),
                Quote::new(NAME_PLACEHOLDER, QuoteValue::Number(dec!(2.05))),
            ]
        );
    }

    #[test]
    fn test_parse_price() {
        let series = Xq.parse_response(BODY, &codes(), Mode::Price).unwrap();
        assert_eq!(series[1].value, QuoteValue::Number(dec!(20001.5)));
    }

    #[test]
    fn test_absent_symbol_is_unavailable() {
        let body = r#"{"data":[{"symbol":"SH000001","current":3250.12,"percent":0.39}]}"#;
        let series = Xq.parse_response(body, &codes(), Mode::Percent).unwrap();
        assert_eq!(series[2], Quote::unavailable());
    }

    #[test]
    fn test_not_json_is_error() {
        assert!(Xq.parse_response("<html>", &codes(), Mode::Percent).is_err());
    }
}
