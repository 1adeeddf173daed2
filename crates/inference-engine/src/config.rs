//! Forest configuration

use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Number of candidate features drawn at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// floor(sqrt(n_features)), at least one
    Sqrt,
    /// Every feature
    All,
    /// Fixed count
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` inputs
    pub fn resolve(&self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(n) => *n,
        }
    }
}

/// Per-class sample weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// `n_samples / (n_classes * class_count)`
    Balanced,
    /// Every sample weighs 1
    Uniform,
}

/// Forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum tree depth (root is depth 0)
    pub max_depth: usize,
    /// Candidate features per split
    pub max_features: MaxFeatures,
    /// Minimum distinct samples a node needs to be split
    pub min_samples_split: usize,
    /// Class weighting strategy
    pub class_weight: ClassWeight,
    /// Base seed; tree `t` uses `seed + t`
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            max_features: MaxFeatures::Sqrt,
            min_samples_split: 2,
            class_weight: ClassWeight::Balanced,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Check the configuration against the feature count
    pub fn validate(&self, n_features: usize) -> Result<(), InferenceError> {
        if self.n_trees == 0 {
            return Err(InferenceError::InvalidConfig("n_trees must be > 0".into()));
        }
        if self.max_depth == 0 {
            return Err(InferenceError::InvalidConfig("max_depth must be > 0".into()));
        }
        if self.min_samples_split < 2 {
            return Err(InferenceError::InvalidConfig(
                "min_samples_split must be >= 2".into(),
            ));
        }
        let k = self.max_features.resolve(n_features);
        if k == 0 || k > n_features {
            return Err(InferenceError::InvalidConfig(format!(
                "max_features resolves to {}, expected 1..={}",
                k, n_features
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForestConfig::default();
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.seed, 42);
        assert!(config.validate(8).is_ok());
    }

    #[test]
    fn test_sqrt_features() {
        assert_eq!(MaxFeatures::Sqrt.resolve(8), 2);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(8), 8);
    }

    #[test]
    fn test_invalid_configs() {
        let zero_trees = ForestConfig {
            n_trees: 0,
            ..Default::default()
        };
        assert!(zero_trees.validate(8).is_err());

        let too_many = ForestConfig {
            max_features: MaxFeatures::Fixed(9),
            ..Default::default()
        };
        assert!(too_many.validate(8).is_err());
    }
}
