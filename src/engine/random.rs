//! Randomness sources

use rand::Rng;
use std::collections::VecDeque;

use crate::common::traits::RandomSource;

/// Thread-local generator from `rand`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len.max(1))
    }

    fn between(&mut self, low: u64, high: u64) -> u64 {
        rand::rng().random_range(low..=high.max(low))
    }
}

/// Scripted picks for deterministic runs
///
/// Picks are taken in order, reduced modulo the candidate count, and `0`
/// once the script is exhausted. `between` always answers the low bound.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    picks: VecDeque<usize>,
}

impl SequenceRandom {
    pub fn new(picks: Vec<usize>) -> Self {
        Self {
            picks: picks.into(),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len.max(1)
    }

    fn between(&mut self, low: u64, _high: u64) -> u64 {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_bounds() {
        let mut rng = ThreadRandom;
        for _ in 0..100 {
            assert!(rng.pick(3) < 3);
            let value = rng.between(8, 10);
            assert!((8..=10).contains(&value));
        }
    }

    #[test]
    fn test_sequence_random_wraps() {
        let mut rng = SequenceRandom::new(vec![1, 7]);
        assert_eq!(rng.pick(4), 1);
        assert_eq!(rng.pick(4), 3);
        assert_eq!(rng.pick(4), 0);
        assert_eq!(rng.between(5, 9), 5);
    }
}
