//! Rest days, session windows and sleep jitter

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::time::Duration;

use crate::common::traits::RandomSource;
use crate::config::types::TradingWindow;

/// Weekend, or one of the configured rest dates
pub fn is_rest_day(date: NaiveDate, rest_dates: &[String]) -> bool {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return true;
    }
    let key = date.format("%Y-%m-%d").to_string();
    rest_dates.iter().any(|d| *d == key)
}

/// Whether `time` falls in any trading window
pub fn in_session(time: NaiveTime, sessions: &[TradingWindow]) -> bool {
    sessions.iter().any(|window| window.contains(time))
}

/// Sleep before the next tick: uniform in `[delay - 2, delay]`, at least a second
pub fn jittered_delay(delay: u64, rng: &mut dyn RandomSource) -> Duration {
    let high = delay.max(1);
    let low = delay.saturating_sub(2).max(1);
    Duration::from_secs(rng.between(low, high))
}
