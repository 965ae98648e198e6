//! Randomness for the composer.
//!
//! The composer only needs inclusive integer draws. Any `rand::Rng` works;
//! [`ScriptedSource`] replays fixed values for deterministic layouts.

use std::collections::VecDeque;

use rand::Rng;
use ring_common::{RingError, RingResult};

/// Source of uniformly distributed integers.
pub trait RandomSource {
    /// Uniform integer in `[lo, hi]`, both ends included.
    fn uniform(&mut self, lo: u32, hi: u32) -> RingResult<u32>;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn uniform(&mut self, lo: u32, hi: u32) -> RingResult<u32> {
        if lo > hi {
            return Err(RingError::Random(format!("empty range [{lo}, {hi}]")));
        }
        Ok(self.random_range(lo..=hi))
    }
}

/// Replays a fixed list of values, failing once it runs dry or when a value
/// falls outside the requested range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: VecDeque<u32>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Values not yet consumed
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self, lo: u32, hi: u32) -> RingResult<u32> {
        if lo > hi {
            return Err(RingError::Random(format!("empty range [{lo}, {hi}]")));
        }

        let v = self
            .values
            .pop_front()
            .ok_or_else(|| RingError::Random("script exhausted".to_string()))?;

        if !(lo..=hi).contains(&v) {
            return Err(RingError::Random(format!("scripted value {v} outside [{lo}, {hi}]")));
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_rng_draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = rng.uniform(3, 6).unwrap();
            assert!((3..=6).contains(&v));
        }
        assert_eq!(rng.uniform(9, 9).unwrap(), 9);
    }

    #[test]
    fn test_rng_rejects_empty_range() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(rng.uniform(5, 4), Err(RingError::Random(_))));
    }

    #[test]
    fn test_rng_hits_both_ends() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<u32> = (0..500).map(|_| rng.uniform(1, 4).unwrap()).collect();
        assert!(draws.contains(&1));
        assert!(draws.contains(&4));
    }

    #[test]
    fn test_scripted_source_replays_then_fails() {
        let mut src = ScriptedSource::new([2, 0, 7]);
        assert_eq!(src.uniform(1, 3).unwrap(), 2);
        assert_eq!(src.uniform(0, 0).unwrap(), 0);
        assert_eq!(src.remaining(), 1);

        assert!(matches!(src.uniform(0, 5), Err(RingError::Random(_))));
        assert!(matches!(src.uniform(0, 5), Err(RingError::Random(_))));
    }
}
