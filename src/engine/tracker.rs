//! Threshold crossings and the session's already-notified set

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::common::types::{AlertClass, Quote, QuoteValue};
use crate::config::types::ThresholdConfig;

/// Result of evaluating one series
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    /// Notified set after this series
    pub notified: BTreeSet<usize>,
    /// One `name: value` line per new crossing
    pub alerts: Vec<String>,
    /// Image for the batch, `None` when nothing crossed
    pub class: Option<AlertClass>,
    /// Slots that came back without a value
    pub anomalies: Vec<String>,
}

/// Evaluate `series` against the thresholds
///
/// Slots in `notified`, unavailable slots and missing slots never cross.
/// Index slot `i` uses `thresholds.indices[i]`; equities use `up` for
/// positive values and `down` otherwise. Boundaries are inclusive.
pub fn evaluate(
    series: &[Quote],
    thresholds: &ThresholdConfig,
    notified: &BTreeSet<usize>,
) -> Evaluation {
    let mut evaluation = Evaluation {
        notified: notified.clone(),
        ..Evaluation::default()
    };
    let mut up = false;
    let mut down = false;

    for (slot, quote) in series.iter().enumerate() {
        let value = match quote.value {
            QuoteValue::Number(value) => value,
            QuoteValue::Unavailable => continue,
            QuoteValue::Missing => {
                evaluation
                    .anomalies
                    .push(format!("{} has no value (slot {})", quote.name, slot));
                continue;
            }
        };
        if notified.contains(&slot) {
            continue;
        }

        let threshold = match thresholds.indices.get(slot) {
            Some(threshold) => *threshold,
            None if value > Decimal::ZERO => thresholds.up,
            None => thresholds.down,
        };

        let crossed = if value > Decimal::ZERO {
            up |= value >= threshold;
            value >= threshold
        } else {
            down |= value <= -threshold;
            value <= -threshold
        };

        if crossed {
            evaluation
                .alerts
                .push(format!("{}: {}", quote.name, value.normalize()));
            evaluation.notified.insert(slot);
        }
    }

    evaluation.class = AlertClass::from_crossings(up, down);
    evaluation
}

/// Session-scoped notified set with day-boundary reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTracker {
    notified: BTreeSet<usize>,
    day: NaiveDate,
}

impl NotificationTracker {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            notified: BTreeSet::new(),
            day,
        }
    }

    /// Tracker continuing from a persisted set
    pub fn seeded(day: NaiveDate, notified: impl IntoIterator<Item = usize>) -> Self {
        Self {
            notified: notified.into_iter().collect(),
            day,
        }
    }

    /// Clear after a configuration reload
    pub fn reset(&mut self, day: NaiveDate) {
        self.notified.clear();
        self.day = day;
    }

    /// Clear when `today` is a new calendar day; returns whether it did
    pub fn roll_day(&mut self, today: NaiveDate) -> bool {
        if today == self.day {
            return false;
        }
        self.reset(today);
        true
    }

    /// Evaluate a series and remember new crossings
    pub fn apply(&mut self, series: &[Quote], thresholds: &ThresholdConfig) -> Evaluation {
        let evaluation = evaluate(series, thresholds, &self.notified);
        self.notified = evaluation.notified.clone();
        evaluation
    }

    pub fn notified(&self) -> Vec<usize> {
        self.notified.iter().copied().collect()
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }
}
