//! Random values for running without upstream credentials

use super::{async_trait, Fetcher};
use crate::error::FetchError;
use crate::models::Entity;
use rand::Rng;
use std::ops::RangeInclusive;

/// Uniform random integer readings within an inclusive range
#[derive(Debug, Clone)]
pub struct SyntheticFetcher {
    range: RangeInclusive<i64>,
}

impl SyntheticFetcher {
    pub fn new(range: RangeInclusive<i64>) -> Self {
        Self { range }
    }

    /// Draw one value without going through the trait
    pub fn sample(&self) -> f64 {
        sample(&self.range)
    }
}

/// Draw a value from `range`; an inverted range collapses to its start
pub fn sample(range: &RangeInclusive<i64>) -> f64 {
    let (lo, hi) = (*range.start(), *range.end());
    if lo >= hi {
        return lo as f64;
    }
    rand::thread_rng().gen_range(lo..=hi) as f64
}

#[async_trait]
impl Fetcher for SyntheticFetcher {
    async fn fetch(&self, _entity: &Entity) -> Result<f64, FetchError> {
        Ok(self.sample())
    }

    fn source(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_within_range() {
        let fetcher = SyntheticFetcher::new(68..=77);
        let entity = Entity::location("ELY MN", 0.0, 0.0);

        for _ in 0..200 {
            let value = fetcher.fetch(&entity).await.unwrap();
            assert!((68.0..=77.0).contains(&value));
            assert_eq!(value.fract(), 0.0);
        }
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(sample(&(5..=5)), 5.0);
        #[allow(clippy::reversed_empty_ranges)]
        let inverted = 9..=3;
        assert_eq!(sample(&inverted), 9.0);
    }
}
