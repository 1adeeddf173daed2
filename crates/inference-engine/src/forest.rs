//! Bootstrap-aggregated decision forest

use crate::config::{ClassWeight, ForestConfig};
use crate::tree::{DecisionTree, TreeParams};
use crate::InferenceError;
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Ensemble of decision trees voting a binary risk class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Fitted trees
    trees: Vec<DecisionTree>,
    /// Sorted class labels observed during training
    classes: Vec<u8>,
    /// Configuration used for training
    config: ForestConfig,
}

impl RandomForest {
    /// Train a forest on standardized rows and binary labels
    pub fn fit(
        x: &[FeatureVector],
        y: &[u8],
        config: &ForestConfig,
    ) -> Result<Self, InferenceError> {
        if x.is_empty() {
            return Err(InferenceError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(InferenceError::LabelCountMismatch {
                features: x.len(),
                labels: y.len(),
            });
        }
        if let Some((index, &label)) = y.iter().enumerate().find(|(_, &l)| l > 1) {
            return Err(InferenceError::InvalidLabel { index, label });
        }
        if let Some(row) = x.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::NonFiniteFeature(row));
        }
        config.validate(FEATURE_DIMENSION)?;

        let counts = class_counts(y);
        let classes: Vec<u8> = (0..2u8).filter(|&c| counts[c as usize] > 0).collect();
        let class_weights = match config.class_weight {
            ClassWeight::Balanced => balanced_weights(counts),
            ClassWeight::Uniform => [1.0, 1.0],
        };

        info!(
            "Training forest: {} trees, max_depth={}, {} samples, class counts {:?}, weights {:?}",
            config.n_trees, config.max_depth, x.len(), counts, class_weights
        );

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: config.max_features.resolve(FEATURE_DIMENSION),
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(t as u64));
                let weights = bootstrap_weights(&mut rng, y, class_weights);
                DecisionTree::fit(x, y, &weights, params, &mut rng)
            })
            .collect();

        let mean_depth =
            trees.iter().map(|t| t.depth()).sum::<usize>() as f64 / trees.len() as f64;
        debug!("Forest trained: mean tree depth {:.2}", mean_depth);

        Ok(Self {
            trees,
            classes,
            config: config.clone(),
        })
    }

    /// Classes observed during training
    pub fn classes(&self) -> &[u8] {
        &self.classes
    }

    /// Whether both classes were present in the training labels
    pub fn has_two_classes(&self) -> bool {
        self.classes.len() == 2
    }

    /// Number of trees voting for the high-risk class
    pub fn positive_votes(&self, vector: &FeatureVector) -> usize {
        self.trees.iter().filter(|t| t.predict(vector) == 1).count()
    }

    /// Fraction of trees voting for the high-risk class
    pub fn predict_proba(&self, vector: &FeatureVector) -> Result<f64, InferenceError> {
        if !self.has_two_classes() {
            return Err(InferenceError::SingleClassModel {
                class: self.classes.first().copied().unwrap_or(0),
            });
        }
        Ok(self.positive_votes(vector) as f64 / self.trees.len() as f64)
    }

    /// Majority vote; ties go to class 0
    pub fn predict_class(&self, vector: &FeatureVector) -> u8 {
        if !self.has_two_classes() {
            return self.classes.first().copied().unwrap_or(0);
        }
        u8::from(self.positive_votes(vector) * 2 > self.trees.len())
    }

    /// Fraction of rows whose majority vote matches the label
    pub fn accuracy(&self, x: &[FeatureVector], y: &[u8]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let correct = x
            .iter()
            .zip(y)
            .filter(|(v, &label)| self.predict_class(v) == label)
            .count();
        correct as f64 / x.len() as f64
    }

    /// Check a deserialized forest before it is used for scoring
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidModel("forest has no trees".into()));
        }
        let classes_ok = matches!(self.classes.as_slice(), [0] | [1] | [0, 1]);
        if !classes_ok {
            return Err(InferenceError::InvalidModel(format!(
                "class set {:?}",
                self.classes
            )));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| InferenceError::InvalidModel(format!("tree {}: {}", t, e)))?;
            if let Some(class) = tree.leaf_classes().find(|c| !self.classes.contains(c)) {
                return Err(InferenceError::InvalidModel(format!(
                    "tree {} predicts class {} outside {:?}",
                    t, class, self.classes
                )));
            }
        }
        Ok(())
    }

    /// Fitted trees
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Training configuration
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

fn class_counts(y: &[u8]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &label in y {
        counts[label as usize] += 1;
    }
    counts
}

/// `n / (n_classes * count_c)` over the observed classes
fn balanced_weights(counts: [usize; 2]) -> [f64; 2] {
    let n: usize = counts.iter().sum();
    let n_classes = counts.iter().filter(|&&c| c > 0).count();
    let mut weights = [0.0; 2];
    for (w, &c) in weights.iter_mut().zip(counts.iter()) {
        if c > 0 {
            *w = n as f64 / (n_classes * c) as f64;
        }
    }
    weights
}

/// Draw `n` indices with replacement; a sample's weight is its draw count
/// times its class weight.
fn bootstrap_weights<R: Rng>(rng: &mut R, y: &[u8], class_weights: [f64; 2]) -> Vec<f64> {
    let n = y.len();
    let mut draws = vec![0u32; n];
    for _ in 0..n {
        draws[rng.gen_range(0..n)] += 1;
    }
    draws
        .iter()
        .zip(y)
        .map(|(&d, &label)| d as f64 * class_weights[label as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::MaxFeatures;

    /// Two well separated clusters in every feature
    fn clusters(n_per_class: usize, n_positive: usize) -> (Vec<FeatureVector>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..n_per_class {
            let jitter = (i % 7) as f64 * 0.05;
            x.push(FeatureVector::new([-1.0 - jitter; FEATURE_DIMENSION]));
            y.push(0);
        }
        for i in 0..n_positive {
            let jitter = (i % 5) as f64 * 0.05;
            x.push(FeatureVector::new([1.0 + jitter; FEATURE_DIMENSION]));
            y.push(1);
        }
        (x, y)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 25,
            ..Default::default()
        }
    }

    #[test]
    fn test_separable_clusters() {
        let (x, y) = clusters(40, 40);
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();

        assert_eq!(forest.classes(), &[0, 1]);
        assert!(forest.has_two_classes());
        assert_eq!(forest.n_trees(), 25);
        assert!(forest.accuracy(&x, &y) > 0.99);

        let low = forest.predict_proba(&FeatureVector::new([-1.0; 8])).unwrap();
        let high = forest.predict_proba(&FeatureVector::new([1.0; 8])).unwrap();
        assert!(high > low);
        assert!((0.0..=1.0).contains(&low) && (0.0..=1.0).contains(&high));
    }

    #[test]
    fn test_training_is_deterministic() {
        let (x, y) = clusters(30, 20);
        let a = RandomForest::fit(&x, &y, &small_config()).unwrap();
        let b = RandomForest::fit(&x, &y, &small_config()).unwrap();
        assert_eq!(a, b);

        let other_seed = ForestConfig {
            seed: 7,
            ..small_config()
        };
        let c = RandomForest::fit(&x, &y, &other_seed).unwrap();
        assert_eq!(c.config().seed, 7);
    }

    #[test]
    fn test_single_class_model() {
        let (x, y) = clusters(20, 0);
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();

        assert_eq!(forest.classes(), &[0]);
        assert!(!forest.has_two_classes());
        assert_eq!(
            forest.predict_proba(&x[0]),
            Err(InferenceError::SingleClassModel { class: 0 })
        );
        assert_eq!(forest.predict_class(&FeatureVector::new([5.0; 8])), 0);
    }

    #[test]
    fn test_balanced_weights() {
        let w = balanced_weights([30, 10]);
        assert!((w[0] - 40.0 / 60.0).abs() < 1e-12);
        assert!((w[1] - 2.0).abs() < 1e-12);

        // Weighted totals are equal across classes
        assert!((w[0] * 30.0 - w[1] * 10.0).abs() < 1e-9);

        let single = balanced_weights([12, 0]);
        assert_eq!(single, [1.0, 0.0]);
    }

    #[test]
    fn test_bootstrap_draws_n_samples() {
        let mut rng = StdRng::seed_from_u64(42);
        let y = vec![0u8; 50];
        let w = bootstrap_weights(&mut rng, &y, [1.0, 1.0]);
        assert_eq!(w.iter().sum::<f64>() as usize, 50);
        // Sampling with replacement leaves some rows out
        assert!(w.iter().any(|&v| v == 0.0));
    }

    #[test]
    fn test_imbalanced_minority_still_detected() {
        let (x, y) = clusters(90, 10);
        let forest = RandomForest::fit(
            &x,
            &y,
            &ForestConfig {
                n_trees: 30,
                max_features: MaxFeatures::All,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(forest.predict_class(&FeatureVector::new([1.1; 8])), 1);
    }

    #[test]
    fn test_input_errors() {
        let (x, y) = clusters(5, 5);
        assert_eq!(
            RandomForest::fit(&[], &[], &small_config()),
            Err(InferenceError::EmptyTrainingSet)
        );
        assert_eq!(
            RandomForest::fit(&x, &y[..3], &small_config()),
            Err(InferenceError::LabelCountMismatch {
                features: 10,
                labels: 3
            })
        );
        let mut bad = y.clone();
        bad[2] = 3;
        assert_eq!(
            RandomForest::fit(&x, &bad, &small_config()),
            Err(InferenceError::InvalidLabel { index: 2, label: 3 })
        );
    }

    #[test]
    fn test_validate_fitted_and_malformed() {
        let (x, y) = clusters(15, 15);
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        assert!(forest.validate().is_ok());

        let no_trees = RandomForest {
            trees: vec![],
            ..forest.clone()
        };
        assert!(matches!(no_trees.validate(), Err(InferenceError::InvalidModel(_))));

        let bad_classes = RandomForest {
            classes: vec![1, 0],
            ..forest.clone()
        };
        assert!(bad_classes.validate().is_err());

        // Two-class trees under a single-class label set
        let narrowed = RandomForest {
            classes: vec![0],
            ..forest
        };
        assert!(narrowed.validate().is_err());

        let (x, y) = clusters(20, 0);
        let single = RandomForest::fit(&x, &y, &small_config()).unwrap();
        assert!(single.validate().is_ok());
    }

    #[test]
    fn test_postcard_round_trip_preserves_votes() {
        let (x, y) = clusters(15, 15);
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        let bytes = postcard::to_allocvec(&forest).unwrap();
        let restored: RandomForest = postcard::from_bytes(&bytes).unwrap();
        for v in &x {
            assert_eq!(forest.positive_votes(v), restored.positive_votes(v));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        #[test]
        fn prop_probability_is_bounded(values in prop::array::uniform8(-10.0f64..10.0)) {
            let (x, y) = clusters(12, 12);
            let config = ForestConfig { n_trees: 5, ..Default::default() };
            let forest = RandomForest::fit(&x, &y, &config).unwrap();
            let p = forest.predict_proba(&FeatureVector::new(values)).unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
