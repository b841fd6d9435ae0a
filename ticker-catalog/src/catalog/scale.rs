//! Market capitalization bucket scale.
//!
//! Ten log-spaced thresholds (in millions) spanning 0 to the largest market
//! cap rounded up to the next 100,000, so a 1-10 ordinal selection can be
//! turned into an actual cap bound.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Number of thresholds in a scale.
pub const BUCKET_COUNT: usize = 10;

/// Granularity of the rounded maximum, in millions.
const MAX_ROUNDING: f64 = 100_000.0;

/// Generate the thresholds for a maximum market cap in millions.
///
/// The first threshold is 0 and the last is the rounded maximum. The ones
/// between are rounded by magnitude: one decimal below 1,000, then floored
/// to 100, 1,000 and 10,000, and ceiled to 100,000 from 1,000,000 up.
pub fn generate_buckets(max_market_cap: f64) -> [f64; BUCKET_COUNT] {
    let rounded_max = round_max(max_market_cap);
    let exponent_step = rounded_max.log10() / (BUCKET_COUNT - 1) as f64;

    let mut buckets = [0.0; BUCKET_COUNT];
    for (i, bucket) in buckets.iter_mut().enumerate().skip(1) {
        *bucket = round_by_magnitude(10f64.powf(i as f64 * exponent_step));
    }
    buckets[BUCKET_COUNT - 1] = rounded_max;

    buckets
}

fn round_max(max_market_cap: f64) -> f64 {
    if !max_market_cap.is_finite() || max_market_cap <= 0.0 {
        return MAX_ROUNDING;
    }
    (max_market_cap / MAX_ROUNDING).ceil() * MAX_ROUNDING
}

fn round_by_magnitude(value: f64) -> f64 {
    if value < 1_000.0 {
        (value * 10.0).round() / 10.0
    } else if value < 10_000.0 {
        (value / 100.0).floor() * 100.0
    } else if value < 100_000.0 {
        (value / 1_000.0).floor() * 1_000.0
    } else if value < 1_000_000.0 {
        (value / 10_000.0).floor() * 10_000.0
    } else {
        (value / 100_000.0).ceil() * 100_000.0
    }
}

// ============================================================================
// Bucket Scale
// ============================================================================

/// Thresholds for one clean baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketScale {
    values: [f64; BUCKET_COUNT],
}

impl BucketScale {
    /// Build the scale for a maximum market cap in millions.
    pub fn from_max(max_market_cap: f64) -> Self {
        Self {
            values: generate_buckets(max_market_cap),
        }
    }

    pub fn values(&self) -> &[f64; BUCKET_COUNT] {
        &self.values
    }

    /// The rounded maximum (last threshold).
    pub fn rounded_max(&self) -> f64 {
        self.values[BUCKET_COUNT - 1]
    }

    /// Threshold for a 1-based ordinal.
    pub fn threshold(&self, ordinal: u8) -> Result<f64> {
        let index = usize::from(ordinal)
            .checked_sub(1)
            .filter(|i| *i < BUCKET_COUNT)
            .ok_or_else(|| {
                CatalogError::validation(format!(
                    "bucket ordinal must be between 1 and {}, got {}",
                    BUCKET_COUNT, ordinal
                ))
            })?;
        Ok(self.values[index])
    }

    /// Cap bounds for an ordinal range, `lo` and `hi` inclusive.
    pub fn range(&self, lo: u8, hi: u8) -> Result<(f64, f64)> {
        if lo > hi {
            return Err(CatalogError::validation(format!(
                "bucket range is inverted: {} > {}",
                lo, hi
            )));
        }
        Ok((self.threshold(lo)?, self.threshold(hi)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scale() {
        assert_eq!(
            generate_buckets(250_000.0),
            [0.0, 4.1, 16.5, 66.9, 271.8, 1_100.0, 4_400.0, 18_000.0, 73_000.0, 300_000.0]
        );
    }

    #[test]
    fn test_large_max_is_pinned() {
        let buckets = generate_buckets(3_000_000.0);
        assert_eq!(buckets[0], 0.0);
        assert_eq!(buckets[7], 100_000.0);
        assert_eq!(buckets[8], 570_000.0);
        assert_eq!(buckets[9], 3_000_000.0);
    }

    #[test]
    fn test_small_max_rounds_up() {
        let buckets = generate_buckets(12.5);
        assert_eq!(buckets[1], 3.6);
        assert_eq!(buckets[9], 100_000.0);
    }

    #[test]
    fn test_degenerate_max() {
        for max in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let buckets = generate_buckets(max);
            assert_eq!(buckets[0], 0.0);
            assert_eq!(buckets[9], 100_000.0);
        }
    }

    #[test]
    fn test_scale_is_non_decreasing() {
        for max in [1.0, 99.9, 5_000.0, 250_000.0, 2_999_999.0, 45_000_000.0] {
            let buckets = generate_buckets(max);
            assert!(buckets.windows(2).all(|w| w[0] <= w[1]), "max {}", max);
        }
    }

    #[test]
    fn test_threshold_ordinals() {
        let scale = BucketScale::from_max(250_000.0);
        assert_eq!(scale.threshold(1).unwrap(), 0.0);
        assert_eq!(scale.threshold(5).unwrap(), 271.8);
        assert_eq!(scale.threshold(10).unwrap(), 300_000.0);
        assert_eq!(scale.rounded_max(), 300_000.0);

        for bad in [0u8, 11, 255] {
            assert!(scale.threshold(bad).unwrap_err().is_validation());
        }
    }

    #[test]
    fn test_range() {
        let scale = BucketScale::from_max(250_000.0);
        assert_eq!(scale.range(2, 4).unwrap(), (4.1, 66.9));
        assert_eq!(scale.range(3, 3).unwrap(), (16.5, 16.5));
        assert!(scale.range(6, 2).is_err());
        assert!(scale.range(1, 11).is_err());
    }
}
