//! Column Statistics Computation

use crate::features::{FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Summary statistics for one feature column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divisor = n)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl ColumnStatistics {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        // Population variance, two-pass for stability
        let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std_dev = (m2 / n).sqrt();

        Self {
            mean,
            std_dev,
            min,
            max,
        }
    }
}

/// Compute statistics for every schema position across a set of rows
pub fn column_statistics(rows: &[FeatureVector]) -> [ColumnStatistics; FEATURE_DIMENSION] {
    debug!("Computing column statistics over {} rows", rows.len());

    let mut stats = [ColumnStatistics::default(); FEATURE_DIMENSION];
    let mut column = Vec::with_capacity(rows.len());
    for (idx, slot) in stats.iter_mut().enumerate() {
        column.clear();
        column.extend(rows.iter().map(|r| r.values[idx]));
        *slot = ColumnStatistics::compute(&column);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = ColumnStatistics::compute(&values);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_population_std_dev() {
        // Population std dev of this classic set is exactly 2
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = ColumnStatistics::compute(&values);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_has_zero_std() {
        let stats = ColumnStatistics::compute(&[36.6; 10]);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_empty_values() {
        let stats = ColumnStatistics::compute(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_columns_are_independent() {
        let rows = vec![
            FeatureVector::new([1.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            FeatureVector::new([3.0, 30.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ];
        let stats = column_statistics(&rows);
        assert!((stats[0].mean - 2.0).abs() < 1e-12);
        assert!((stats[1].mean - 20.0).abs() < 1e-12);
        assert!((stats[1].std_dev - 10.0).abs() < 1e-12);
        assert_eq!(stats[7].std_dev, 0.0);
    }

    proptest! {
        #[test]
        fn prop_mean_within_range(values in prop::collection::vec(-1000.0f64..1000.0, 1..64)) {
            let stats = ColumnStatistics::compute(&values);
            prop_assert!(stats.min - 1e-9 <= stats.mean && stats.mean <= stats.max + 1e-9);
            prop_assert!(stats.std_dev >= 0.0);
        }
    }
}
