//! Sina `hq.sinajs.cn` endpoint
//!
//! Lines look like `var hq_str_<code>="a,b,c";`. The short index/equity form
//! carries name, price, change and percent; the long Hong Kong form carries
//! the name at 1, price at 6 and percent at 8.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::codes::{CodeSyntax, ExchangeAffixes, HIGH_BREAKPOINT, LOW_BREAKPOINT};
use super::{display_name, parse_decimal, rejoin, split_assignment};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{QuoteSource, RandomSource};
use crate::common::types::{Mode, Quote, QuoteValue};

const LONG_FORM_FIELDS: usize = 8;

const SYNTAX: CodeSyntax = CodeSyntax {
    breakpoints: (LOW_BREAKPOINT, HIGH_BREAKPOINT),
    equities: ExchangeAffixes::prefixes("s_sz", "s_sh", "s_bj"),
    indices: ExchangeAffixes::prefixes("s_sz", "s_sh", "s_bj"),
    mnemonics: &[("HSI", "rt_hk")],
};

/// Sina quote source
#[derive(Debug, Clone, Copy, Default)]
pub struct Sina;

impl QuoteSource for Sina {
    fn name(&self) -> &'static str {
        "sina"
    }

    fn default_base(&self) -> &'static str {
        "https://hq.sinajs.cn"
    }

    fn referer(&self) -> &'static str {
        "https://finance.sina.com.cn"
    }

    fn supports_price(&self) -> bool {
        true
    }

    fn build_url(&self, base: &str, codes: &str, _rng: &mut dyn RandomSource) -> String {
        format!(
            "{}/rn={}&list={}",
            base.trim_end_matches('/'),
            Utc::now().timestamp_millis(),
            codes
        )
    }

    fn convert_code(&self, code: &str, is_index: bool) -> Result<String> {
        SYNTAX.convert(self.name(), code, is_index)
    }

    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>> {
        let mut entries = HashMap::with_capacity(codes.len());
        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, payload) = split_assignment(line)?;
            let code = key.trim_start_matches("var ").trim_start_matches("hq_str_");
            if !codes.iter().any(|c| c == code) {
                continue;
            }
            // an empty payload is how unknown codes are answered
            if payload.is_empty() {
                continue;
            }

            let fields: Vec<&str> = payload.split(',').collect();
            entries.insert(code.to_string(), parse_fields(code, &fields, mode)?);
        }

        Ok(rejoin(codes, entries))
    }
}

fn parse_fields(code: &str, fields: &[&str], mode: Mode) -> Result<Quote> {
    if fields.len() > LONG_FORM_FIELDS {
        let field = match mode {
            Mode::Price => 6,
            Mode::Percent => 8,
        };
        let value = QuoteValue::Number(parse_decimal(fields[field])?);
        return Ok(Quote::new(display_name(fields[1]), value));
    }

    if fields.len() < 4 {
        return Err(RunnerError::parse(format!(
            "{} has {} fields, expected at least 4",
            code,
            fields.len()
        )));
    }

    let price = parse_decimal(fields[1])?;
    let value = if price == Decimal::ZERO {
        QuoteValue::Unavailable
    } else {
        match mode {
            Mode::Price => QuoteValue::Number(price),
            Mode::Percent => QuoteValue::Number(parse_decimal(fields[3])?),
        }
    };
    Ok(Quote::new(display_name(fields[0]), value))
}
