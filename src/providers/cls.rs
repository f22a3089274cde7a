//! Cailian Press `refresh` endpoint
//!
//! JSON `{"data": {"<code>": fraction}}`. Percent only; the fraction is
//! scaled to a percentage rounded to two places.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::codes::{Affix, CodeSyntax, ExchangeAffixes, HIGH_BREAKPOINT, LOW_BREAKPOINT};
use super::{json_value, rejoin};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{QuoteSource, RandomSource};
use crate::common::types::{Mode, Quote, QuoteValue, NAME_PLACEHOLDER};

const AFFIXES: ExchangeAffixes = ExchangeAffixes {
    shenzhen: Affix::Prefix("sz"),
    shanghai: Affix::Prefix("sh"),
    beijing: Affix::Suffix(".BJ"),
};

const SYNTAX: CodeSyntax = CodeSyntax {
    breakpoints: (LOW_BREAKPOINT, HIGH_BREAKPOINT),
    equities: AFFIXES,
    indices: AFFIXES,
    mnemonics: &[("HSI", "HK")],
};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    data: Option<HashMap<String, Value>>,
}

/// Cailian Press quote source
#[derive(Debug, Clone, Copy, Default)]
pub struct Cls;

impl QuoteSource for Cls {
    fn name(&self) -> &'static str {
        "cls"
    }

    fn default_base(&self) -> &'static str {
        "https://x-quote.cls.cn"
    }

    fn referer(&self) -> &'static str {
        "https://www.cls.cn/"
    }

    fn supports_price(&self) -> bool {
        false
    }

    fn build_url(&self, base: &str, codes: &str, _rng: &mut dyn RandomSource) -> String {
        format!(
            "{}/quote/stock/refresh?secu_codes={}&app=CailianpressWeb&os=web&sv=8.4.6&sign=9f8797a1f4de66c2370f7a03990d2737",
            base.trim_end_matches('/'),
            codes
        )
    }

    fn convert_code(&self, code: &str, is_index: bool) -> Result<String> {
        SYNTAX.convert(self.name(), code, is_index)
    }

    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>> {
        let response: RefreshResponse = serde_json::from_str(body)?;
        let data = response
            .data
            .ok_or_else(|| RunnerError::parse("response carries no data"))?;

        if mode == Mode::Price {
            return Ok(codes
                .iter()
                .map(|_| Quote::new(NAME_PLACEHOLDER, QuoteValue::Unavailable))
                .collect());
        }

        let mut entries = HashMap::with_capacity(data.len());
        for (code, raw) in data {
            let value = match json_value(&raw)? {
                QuoteValue::Number(fraction) => {
                    QuoteValue::Number((fraction * Decimal::ONE_HUNDRED).round_dp(2))
                }
                other => other,
            };
            entries.insert(code, Quote::new(NAME_PLACEHOLDER, value));
        }

        Ok(rejoin(codes, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BODY: &str = r#"{"code":200,"data":{"sh600519":0.020512,"sh000001":0.00389,"830799.BJ":null}}"#;

    fn codes() -> Vec<String> {
        vec![
            "sh000001".to_string(),
            "HKHSI".to_string(),
            "sh600519".to_string(),
            "830799.BJ".to_string(),
        ]
    }

    #[test]
    fn test_convert_code() {
        assert_eq!(Cls.convert_code("000001", true).unwrap(), "sh000001");
        assert_eq!(Cls.convert_code("899050", true).unwrap(), "899050.BJ");
        assert_eq!(Cls.convert_code("830799", false).unwrap(), "830799.BJ");
        assert_eq!(Cls.convert_code("HSI", true).unwrap(), "HKHSI");
    }

    #[test]
    fn test_parse_scales_fraction() {
        let series = Cls.parse_response(BODY, &codes(), Mode::Percent).unwrap();
        assert_eq!(series[0].value, QuoteValue::Number(dec!(0.39)));
        assert_eq!(series[1], Quote::unavailable());
        assert_eq!(series[2].value, QuoteValue::Number(dec!(2.05)));
        assert_eq!(series[3].value, QuoteValue::Missing);
    }

    #[test]
    fn test_price_mode_is_unavailable() {
        let series = Cls.parse_response(BODY, &codes(), Mode::Price).unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|q| q.value == QuoteValue::Unavailable));
    }
}
