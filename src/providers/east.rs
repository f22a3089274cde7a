//! East Money `ulist.np` endpoint
//!
//! Body: `<callback>({"data": {"diff": [{"f2": .., "f3": .., "f12": .., "f13": .., "f14": ..}]}});`
//! with `f2` price, `f3` percent, `f12` bare code, `f13` market id and
//! `f14` name. Entries are re-joined by `f13.f12`.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::codes::{CodeSyntax, ExchangeAffixes, HIGH_BREAKPOINT, LOW_BREAKPOINT};
use super::{display_name, json_value, rejoin, unwrap_padding};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{QuoteSource, RandomSource};
use crate::common::types::{Mode, Quote};

const CALLBACK: &str = "qa_wap_jsonpCB1737645019281";

const SYNTAX: CodeSyntax = CodeSyntax {
    breakpoints: (LOW_BREAKPOINT, HIGH_BREAKPOINT),
    equities: ExchangeAffixes::prefixes("0.", "1.", "0."),
    indices: ExchangeAffixes::prefixes("0.", "1.", "0."),
    mnemonics: &[("HSI", "100.")],
};

#[derive(Debug, Deserialize)]
struct UlistResponse {
    data: Option<UlistData>,
}

#[derive(Debug, Deserialize)]
struct UlistData {
    diff: Value,
}

#[derive(Debug, Deserialize)]
struct UlistItem {
    #[serde(default)]
    f2: Value,
    #[serde(default)]
    f3: Value,
    f12: Value,
    f13: Value,
    #[serde(default)]
    f14: String,
}

/// East Money quote source
#[derive(Debug, Clone, Copy, Default)]
pub struct East;

impl QuoteSource for East {
    fn name(&self) -> &'static str {
        "east"
    }

    fn default_base(&self) -> &'static str {
        "https://push2.eastmoney.com"
    }

    fn referer(&self) -> &'static str {
        "https://guba.eastmoney.com/"
    }

    fn supports_price(&self) -> bool {
        true
    }

    fn build_url(&self, base: &str, codes: &str, _rng: &mut dyn RandomSource) -> String {
        format!(
            "{}/api/qt/ulist.np/get?fltt=2&secids={}&fields=f2,f3,f12,f13,f14&cb={}",
            base.trim_end_matches('/'),
            codes,
            CALLBACK
        )
    }

    fn convert_code(&self, code: &str, is_index: bool) -> Result<String> {
        SYNTAX.convert(self.name(), code, is_index)
    }

    fn parse_response(&self, body: &str, codes: &[String], mode: Mode) -> Result<Vec<Quote>> {
        let json = unwrap_padding(body, '(', ')')?;
        let response: UlistResponse = serde_json::from_str(json)?;
        let data = response
            .data
            .ok_or_else(|| RunnerError::parse("response carries no data"))?;

        // `diff` is usually an array but older deployments send an index-keyed object
        let items: Vec<Value> = match data.diff {
            Value::Array(items) => items,
            Value::Object(map) => map.into_iter().map(|(_, item)| item).collect(),
            other => return Err(RunnerError::parse(format!("unexpected diff: {}", other))),
        };

        let mut entries = HashMap::with_capacity(items.len());
        for item in items {
            let item: UlistItem = serde_json::from_value(item)?;
            let key = format!("{}.{}", plain(&item.f13), plain(&item.f12));
            let value = match mode {
                Mode::Price => json_value(&item.f2)?,
                Mode::Percent => json_value(&item.f3)?,
            };
            entries.insert(key, Quote::new(display_name(&item.f14), value));
        }

        Ok(rejoin(codes, entries))
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
