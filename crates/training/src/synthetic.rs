//! Synthetic two-cluster vitals

use crate::dataset::TrainingDataset;
use crate::TrainingError;
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Healthy population means
pub const HEALTHY_MEAN: [f64; FEATURE_DIMENSION] = [75.0, 16.0, 36.8, 97.0, 120.0, 80.0, 24.0, 93.0];
/// Healthy population standard deviations
pub const HEALTHY_STD: [f64; FEATURE_DIMENSION] = [8.0, 2.0, 0.3, 1.0, 10.0, 8.0, 2.0, 5.0];
/// High-risk population means
pub const HIGH_RISK_MEAN: [f64; FEATURE_DIMENSION] =
    [110.0, 24.0, 38.5, 92.0, 150.0, 95.0, 28.0, 115.0];
/// High-risk population standard deviations
pub const HIGH_RISK_STD: [f64; FEATURE_DIMENSION] = [15.0, 3.0, 0.5, 3.0, 15.0, 10.0, 3.0, 8.0];

/// Synthetic dataset settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Total rows, split evenly between the two clusters
    pub samples: usize,
    /// RNG seed
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            samples: 200,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Draw `samples / 2` healthy rows followed by as many high-risk rows
    pub fn generate(&self) -> Result<TrainingDataset, TrainingError> {
        let per_class = self.samples / 2;
        if per_class == 0 {
            return Err(TrainingError::InvalidSynthetic(format!(
                "need at least 2 samples, got {}",
                self.samples
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let healthy = cluster(HEALTHY_MEAN, HEALTHY_STD)?;
        let high_risk = cluster(HIGH_RISK_MEAN, HIGH_RISK_STD)?;

        let mut dataset = TrainingDataset::default();
        for (dists, label) in [(&healthy, 0u8), (&high_risk, 1u8)] {
            for _ in 0..per_class {
                let mut values = [0.0; FEATURE_DIMENSION];
                for (slot, dist) in values.iter_mut().zip(dists.iter()) {
                    *slot = dist.sample(&mut rng);
                }
                dataset.push(FeatureVector::new(values), label);
            }
        }

        let counts = dataset.class_counts();
        info!(
            "Synthetic data created: {} rows ({} healthy, {} high-risk)",
            dataset.len(),
            counts[0],
            counts[1]
        );
        Ok(dataset)
    }
}

fn cluster(
    mean: [f64; FEATURE_DIMENSION],
    std: [f64; FEATURE_DIMENSION],
) -> Result<Vec<Normal<f64>>, TrainingError> {
    mean.iter()
        .zip(std.iter())
        .map(|(&m, &s)| Normal::new(m, s).map_err(|e| TrainingError::InvalidSynthetic(e.to_string())))
        .collect()
}
