//! Tencent `qt.gtimg.cn` endpoint
//!
//! One `v_<code>="f0~f1~...";` line per code, fields separated by `~`:
//! name at 1, price at 3, percent change at 32.

use std::collections::HashMap;

use super::codes::{CodeSyntax, ExchangeAffixes, HIGH_BREAKPOINT, LOW_BREAKPOINT};
use super::{display_name, parse_decimal, rejoin, split_assignment};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{QuoteSource, RandomSource};
use crate::common::types::{Mode, Quote, QuoteValue};

const NAME_FIELD: usize = 1;
const PRICE_FIELD: usize = 3;
const PERCENT_FIELD: usize = 32;

const SYNTAX: CodeSyntax = CodeSyntax {
    breakpoints: (LOW_BREAKPOINT, HIGH_BREAKPOINT),
    equities: ExchangeAffixes::prefixes("sz", "sh", "bj"),
    indices: ExchangeAffixes::prefixes("sz", "sh", "bj"),
    mnemonics: &[("HSI", "r_hk")],
};

/// Tencent quote source
#[derive(Debug, Clone, Copy, Default)]
pub struct Qq;

impl QuoteSource for Qq {
    fn name(&self) -> &'static str {
        "qq"
    }

    fn default_base(&self) -> &'static str {
        "https://qt.gtimg.cn"
    }

    fn referer(&self) -> &'static str {
        "https://stockapp.finance.qq.com/"
    }

    fn supports_price(&self) -> bool {
        true
    }

    fn build_url(&self, base: &str, codes: &str, rng: &mut dyn RandomSource) -> String {
        let nonce = rng.between(10u64.pow(15), 10u64.pow(16) - 1);
        format!("{}/r=0.{}&q={}", base.trim_end_matches('/'), nonce, codes)
    }

    fn convert_code(&self, code: &str, is_index: bool) -> Result<String> {
        SYNTAX.convert(self.name(), code, is_index)
    }

    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>> {
        let field = match mode {
            Mode::Price => PRICE_FIELD,
            Mode::Percent => PERCENT_FIELD,
        };

        let mut entries = HashMap::with_capacity(codes.len());
        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, payload) = split_assignment(line)?;
            let code = key.trim_start_matches("v_");
            // `v_pv_none_match` and friends answer codes nobody asked for
            if !codes.iter().any(|c| c == code) {
                continue;
            }

            let fields: Vec<&str> = payload.split('~').collect();
            if fields.len() <= field {
                return Err(RunnerError::parse(format!(
                    "{} has {} fields, expected more than {}",
                    code,
                    fields.len(),
                    field
                )));
            }

            let value = QuoteValue::Number(parse_decimal(fields[field])?);
            entries.insert(code.to_string(), Quote::new(display_name(fields[NAME_FIELD]), value));
        }

        Ok(rejoin(codes, entries))
    }
}
