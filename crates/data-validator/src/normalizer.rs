//! Z-Score Normalization

use crate::error::ScalerError;
use feature_engine::{column_statistics, FeatureVector, VitalSign, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Smallest standard deviation used at transform time
pub const MIN_STD_DEV: f64 = 0.0001;

/// Fitted per-feature standardization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Per-feature mean
    means: [f64; FEATURE_DIMENSION],
    /// Per-feature population standard deviation, floored at [`MIN_STD_DEV`]
    std_devs: [f64; FEATURE_DIMENSION],
    /// Features whose standard deviation was floored
    floored: Vec<VitalSign>,
    /// Number of rows the parameters were fitted on
    n_samples: usize,
}

impl ScalerParams {
    /// Build parameters directly, applying the variance floor
    pub fn from_parts(
        means: [f64; FEATURE_DIMENSION],
        std_devs: [f64; FEATURE_DIMENSION],
        n_samples: usize,
    ) -> Self {
        let mut std_devs = std_devs;
        let mut floored = Vec::new();
        for (sign, std) in VitalSign::ALL.iter().zip(std_devs.iter_mut()) {
            if !(*std >= MIN_STD_DEV) {
                warn!(
                    "Zero-variance feature {}: std {} floored to {}",
                    sign.as_str(),
                    std,
                    MIN_STD_DEV
                );
                *std = MIN_STD_DEV;
                floored.push(*sign);
            }
        }

        Self {
            means,
            std_devs,
            floored,
            n_samples,
        }
    }

    /// Check parameters that did not come through [`Normalizer::fit`]
    pub fn validate(&self) -> Result<(), ScalerError> {
        for (i, sign) in VitalSign::ALL.iter().enumerate() {
            let (mean, std) = (self.means[i], self.std_devs[i]);
            if !mean.is_finite() {
                return Err(ScalerError::InvalidParams {
                    feature: sign.as_str(),
                    reason: format!("mean {}", mean),
                });
            }
            if !std.is_finite() || std < MIN_STD_DEV {
                return Err(ScalerError::InvalidParams {
                    feature: sign.as_str(),
                    reason: format!("std {} (minimum {})", std, MIN_STD_DEV),
                });
            }
        }
        Ok(())
    }

    /// Standardize a feature vector: `(x - mean) / std`
    pub fn transform(&self, vector: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_DIMENSION];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (vector.values[i] - self.means[i]) / self.std_devs[i];
        }
        FeatureVector::new(out)
    }

    /// Standardize many vectors
    pub fn transform_all(&self, vectors: &[FeatureVector]) -> Vec<FeatureVector> {
        vectors.iter().map(|v| self.transform(v)).collect()
    }

    /// Per-feature means
    pub fn means(&self) -> &[f64; FEATURE_DIMENSION] {
        &self.means
    }

    /// Per-feature standard deviations as used by `transform`
    pub fn std_devs(&self) -> &[f64; FEATURE_DIMENSION] {
        &self.std_devs
    }

    /// Mean of one vital sign
    pub fn mean(&self, sign: VitalSign) -> f64 {
        self.means[sign.index()]
    }

    /// Standard deviation of one vital sign
    pub fn std_dev(&self, sign: VitalSign) -> f64 {
        self.std_devs[sign.index()]
    }

    /// Features that had zero (or near-zero) variance at fit time
    pub fn floored_features(&self) -> &[VitalSign] {
        &self.floored
    }

    /// Number of fitted rows
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }
}

/// Fits [`ScalerParams`] from training rows
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Learn per-feature mean and population standard deviation
    pub fn fit(rows: &[FeatureVector]) -> Result<ScalerParams, ScalerError> {
        if rows.is_empty() {
            return Err(ScalerError::EmptyDataset);
        }

        if let Some((row, vector)) = rows.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            let feature = vector
                .iter()
                .find(|(_, value)| !value.is_finite())
                .map(|(sign, _)| sign.as_str())
                .unwrap_or("unknown");
            return Err(ScalerError::NonFiniteValue { row, feature });
        }

        let stats = column_statistics(rows);
        let means = stats.map(|s| s.mean);
        let std_devs = stats.map(|s| s.std_dev);

        debug!("Fitted means: {:?}", means);
        debug!("Fitted std devs: {:?}", std_devs);

        let params = ScalerParams::from_parts(means, std_devs, rows.len());
        info!(
            "Scaler fitted on {} rows ({} floored features)",
            rows.len(),
            params.floored_features().len()
        );
        Ok(params)
    }

    /// Fit and transform in one step
    pub fn fit_transform(
        rows: &[FeatureVector],
    ) -> Result<(ScalerParams, Vec<FeatureVector>), ScalerError> {
        let params = Self::fit(rows)?;
        let transformed = params.transform_all(rows);
        Ok((params, transformed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_rows() -> Vec<FeatureVector> {
        vec![
            FeatureVector::new([60.0, 12.0, 36.1, 99.0, 100.0, 60.0, 19.0, 73.3]),
            FeatureVector::new([75.0, 16.0, 36.8, 97.0, 120.0, 80.0, 24.0, 93.3]),
            FeatureVector::new([120.0, 22.0, 39.0, 92.0, 160.0, 100.0, 28.0, 120.0]),
        ]
    }

    #[test]
    fn test_population_statistics() {
        let rows = vec![
            FeatureVector::new([1.0; FEATURE_DIMENSION]),
            FeatureVector::new([3.0; FEATURE_DIMENSION]),
        ];
        let params = Normalizer::fit(&rows).unwrap();
        assert!((params.mean(VitalSign::HeartRate) - 2.0).abs() < 1e-12);
        // Population std of {1, 3} is 1 (sample std would be sqrt(2))
        assert!((params.std_dev(VitalSign::HeartRate) - 1.0).abs() < 1e-12);
        assert_eq!(params.n_samples(), 2);
    }

    #[test]
    fn test_mean_vector_maps_to_zero() {
        let params = Normalizer::fit(&sample_rows()).unwrap();
        let mean_vector = FeatureVector::new(*params.means());
        let z = params.transform(&mean_vector);
        assert!(z.values.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_transformed_columns_have_unit_variance() {
        let (_, transformed) = Normalizer::fit_transform(&sample_rows()).unwrap();
        let stats = column_statistics(&transformed);
        for s in stats.iter() {
            assert!(s.mean.abs() < 1e-9);
            assert!((s.std_dev - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_variance_is_floored() {
        let mut rows = sample_rows();
        for row in rows.iter_mut() {
            row.values[VitalSign::Bmi.index()] = 24.0;
        }
        let params = Normalizer::fit(&rows).unwrap();
        assert_eq!(params.floored_features(), &[VitalSign::Bmi]);
        assert_eq!(params.std_dev(VitalSign::Bmi), MIN_STD_DEV);

        let z = params.transform(&rows[0]);
        assert!(z.is_finite());
        assert_eq!(z[VitalSign::Bmi], 0.0);
    }

    #[test]
    fn test_validate_rejects_unfloored_std() {
        let params = Normalizer::fit(&sample_rows()).unwrap();
        assert!(params.validate().is_ok());

        let mut zero_std = params.clone();
        zero_std.std_devs[VitalSign::Bmi.index()] = 0.0;
        assert_eq!(
            zero_std.validate(),
            Err(ScalerError::InvalidParams {
                feature: "bmi",
                reason: format!("std 0 (minimum {})", MIN_STD_DEV),
            })
        );

        let mut nan_mean = params;
        nan_mean.means[0] = f64::NAN;
        assert!(nan_mean.validate().is_err());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert_eq!(Normalizer::fit(&[]), Err(ScalerError::EmptyDataset));
    }

    #[test]
    fn test_non_finite_training_row_rejected() {
        let mut rows = sample_rows();
        rows[1].values[3] = f64::INFINITY;
        assert_eq!(
            Normalizer::fit(&rows),
            Err(ScalerError::NonFiniteValue {
                row: 1,
                feature: "oxygen_saturation"
            })
        );
    }

    proptest! {
        #[test]
        fn prop_fitted_mean_round_trips_to_zero(
            rows in prop::collection::vec(prop::array::uniform8(-200.0f64..200.0), 1..40)
        ) {
            let rows: Vec<FeatureVector> = rows.into_iter().map(FeatureVector::new).collect();
            let params = Normalizer::fit(&rows).unwrap();
            let z = params.transform(&FeatureVector::new(*params.means()));
            for v in z.values {
                prop_assert!(v.abs() < 1e-6);
            }
        }
    }
}
