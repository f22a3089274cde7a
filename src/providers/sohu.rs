//! Sohu mobile `newstocklistq` endpoint
//!
//! Padded JSON array. The first element is a header, then one entry per
//! requested code: `[code, name, price, "pct%", ...]`, or an empty array for
//! codes it does not carry. Entries are re-joined by their echoed code.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;

use super::codes::{CodeSyntax, ExchangeAffixes, HIGH_BREAKPOINT, LOW_BREAKPOINT};
use super::{display_name, rejoin, text_value, unwrap_padding};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{QuoteSource, RandomSource};
use crate::common::types::{Mode, Quote};

const SYNTAX: CodeSyntax = CodeSyntax {
    breakpoints: (LOW_BREAKPOINT, HIGH_BREAKPOINT),
    equities: ExchangeAffixes::uniform("cn_"),
    indices: ExchangeAffixes::uniform("zs_"),
    mnemonics: &[],
};

/// Sohu quote source
#[derive(Debug, Clone, Copy, Default)]
pub struct Sohu;

impl QuoteSource for Sohu {
    fn name(&self) -> &'static str {
        "sohu"
    }

    fn default_base(&self) -> &'static str {
        "http://s.m.sohu.com"
    }

    fn referer(&self) -> &'static str {
        "http://s.m.sohu.com/h5apps/t/mystock.html"
    }

    fn supports_price(&self) -> bool {
        true
    }

    fn build_url(&self, base: &str, codes: &str, _rng: &mut dyn RandomSource) -> String {
        format!(
            "{}/newstocklistq?code={}&_={}",
            base.trim_end_matches('/'),
            codes,
            Utc::now().timestamp_millis()
        )
    }

    fn convert_code(&self, code: &str, is_index: bool) -> Result<String> {
        SYNTAX.convert(self.name(), code, is_index)
    }

    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>> {
        let trimmed = body.trim();
        let json = if trimmed.starts_with('[') {
            trimmed
        } else {
            unwrap_padding(trimmed, '(', ')')?
        };

        let rows: Vec<Vec<Value>> = serde_json::from_str(json)?;

        // empty rows carry no code; their slots stay unavailable after the re-join
        let mut entries = HashMap::with_capacity(codes.len());
        for row in rows.iter().skip(1).filter(|row| !row.is_empty()) {
            let code = text_field(row, "row", 0)?;
            entries.insert(code.to_string(), parse_row(code, row, mode)?);
        }

        Ok(rejoin(codes, entries))
    }
}

fn parse_row(code: &str, row: &[Value], mode: Mode) -> Result<Quote> {
    let value = match mode {
        Mode::Price => text_value(text_field(row, code, 2)?)?,
        Mode::Percent => text_value(text_field(row, code, 3)?.trim_end_matches('%'))?,
    };
    Ok(Quote::new(display_name(text_field(row, code, 1)?), value))
}

fn text_field<'a>(row: &'a [Value], code: &str, index: usize) -> Result<&'a str> {
    row.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| RunnerError::parse(format!("{} lacks text field {}", code, index)))
}
