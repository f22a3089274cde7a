//! Code translation shared by every provider
//!
//! The exchange bucketing rule lives here once. Each provider only supplies
//! a [`CodeSyntax`] table describing how a bucket is written in its URLs.

use crate::common::errors::{Result, RunnerError};
use crate::config::types::is_numeric_code;

/// Codes below this are listed in Shenzhen
pub const LOW_BREAKPOINT: u32 = 600_000;
/// Codes at or above this are listed in Beijing
pub const HIGH_BREAKPOINT: u32 = 800_000;

/// Exchange a numeric code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Shenzhen,
    Shanghai,
    Beijing,
}

impl Exchange {
    /// Bucket an equity code by the two breakpoints
    pub fn of_equity(code: u32, breakpoints: (u32, u32)) -> Self {
        let (low, high) = breakpoints;
        if code < low {
            Exchange::Shenzhen
        } else if code < high {
            Exchange::Shanghai
        } else {
            Exchange::Beijing
        }
    }

    /// Bucket a numeric index code by its prefix
    pub fn of_index(code: &str) -> Self {
        if code.starts_with("000") {
            Exchange::Shanghai
        } else if code.starts_with("399") {
            Exchange::Shenzhen
        } else {
            Exchange::Beijing
        }
    }
}

/// How a bucket is attached to the bare code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affix {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl Affix {
    pub fn apply(self, code: &str) -> String {
        match self {
            Affix::Prefix(prefix) => format!("{}{}", prefix, code),
            Affix::Suffix(suffix) => format!("{}{}", code, suffix),
        }
    }
}

/// Surface syntax for the three exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeAffixes {
    pub shenzhen: Affix,
    pub shanghai: Affix,
    pub beijing: Affix,
}

impl ExchangeAffixes {
    /// Same prefix for every exchange
    pub const fn uniform(prefix: &'static str) -> Self {
        Self {
            shenzhen: Affix::Prefix(prefix),
            shanghai: Affix::Prefix(prefix),
            beijing: Affix::Prefix(prefix),
        }
    }

    /// One prefix per exchange
    pub const fn prefixes(shenzhen: &'static str, shanghai: &'static str, beijing: &'static str) -> Self {
        Self {
            shenzhen: Affix::Prefix(shenzhen),
            shanghai: Affix::Prefix(shanghai),
            beijing: Affix::Prefix(beijing),
        }
    }

    fn for_exchange(&self, exchange: Exchange) -> Affix {
        match exchange {
            Exchange::Shenzhen => self.shenzhen,
            Exchange::Shanghai => self.shanghai,
            Exchange::Beijing => self.beijing,
        }
    }
}

/// Data-driven code syntax of one provider
#[derive(Debug, Clone, Copy)]
pub struct CodeSyntax {
    /// Low and high breakpoints for equities
    pub breakpoints: (u32, u32),
    pub equities: ExchangeAffixes,
    pub indices: ExchangeAffixes,
    /// Mnemonic index symbol to the prefix written before it
    pub mnemonics: &'static [(&'static str, &'static str)],
}

impl CodeSyntax {
    /// Translate a configured code for `provider`
    pub fn convert(&self, provider: &'static str, code: &str, is_index: bool) -> Result<String> {
        if is_index && !is_numeric_code(code) {
            return self
                .mnemonics
                .iter()
                .find(|(symbol, _)| *symbol == code)
                .map(|(_, prefix)| format!("{}{}", prefix, code))
                .ok_or_else(|| RunnerError::UnknownCode {
                    provider,
                    code: code.to_string(),
                });
        }

        if is_index {
            let exchange = Exchange::of_index(code);
            return Ok(self.indices.for_exchange(exchange).apply(code));
        }

        let numeric: u32 = code
            .parse()
            .ok()
            .filter(|_| is_numeric_code(code))
            .ok_or_else(|| {
                RunnerError::Configuration(format!("Equity code must be numeric: {}", code))
            })?;
        let exchange = Exchange::of_equity(numeric, self.breakpoints);
        Ok(self.equities.for_exchange(exchange).apply(code))
    }
}
