//! Process-wide model state

use crate::error::StartupError;
use crate::pipeline::ProbabilityBasis;
use chrono::{DateTime, Utc};
use data_validator::ScalerParams;
use fallback::{FallbackBootstrapper, ScalerSource};
use feature_engine::FeatureVector;
use inference_engine::{InferenceError, RandomForest};
use serde::Serialize;
use std::time::Duration;
use storage::{check_generation, ArtifactMeta, ArtifactStore};
use tracing::{info, warn};
use uuid::Uuid;

/// How startup treats missing or inconsistent artifacts
#[derive(Debug, Clone)]
pub struct LoadPolicy {
    /// Bootstrap a seed scaler when the scaler blob is unusable
    pub allow_scaler_fallback: bool,
    /// Extra attempts when the two blobs disagree on generation
    pub load_retries: u32,
    /// Pause between attempts (ms)
    pub retry_backoff_ms: u64,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            allow_scaler_fallback: true,
            load_retries: 3,
            retry_backoff_ms: 100,
        }
    }
}

/// Operator-facing description of the loaded state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelHealth {
    /// Where the scaler came from
    pub scaler_source: ScalerSource,
    /// Training generation of the classifier
    pub generation: Option<Uuid>,
    /// When the classifier was trained
    pub trained_at: Option<DateTime<Utc>>,
    /// Classes the classifier observed
    pub classes: Vec<u8>,
    /// Ensemble size
    pub n_trees: usize,
}

impl ModelHealth {
    /// Whether serving runs in degraded accuracy mode
    pub fn is_degraded(&self) -> bool {
        self.scaler_source.is_degraded()
    }
}

/// Fitted scaler and classifier, immutable after construction
#[derive(Debug)]
pub struct ModelState {
    scaler: ScalerParams,
    classifier: RandomForest,
    health: ModelHealth,
}

impl ModelState {
    /// Assemble state from already fitted parts
    pub fn from_parts(
        scaler: ScalerParams,
        classifier: RandomForest,
        scaler_source: ScalerSource,
        meta: Option<ArtifactMeta>,
    ) -> Self {
        let health = ModelHealth {
            scaler_source,
            generation: meta.map(|m| m.generation),
            trained_at: meta.map(|m| m.trained_at),
            classes: classifier.classes().to_vec(),
            n_trees: classifier.n_trees(),
        };
        Self {
            scaler,
            classifier,
            health,
        }
    }

    /// Load both artifacts once at startup
    ///
    /// A missing or corrupt classifier is fatal. A missing or corrupt
    /// scaler is replaced by the seed scaler when the policy allows it.
    /// Blobs from different generations are re-read up to
    /// `load_retries` times before giving up.
    pub fn load(store: &ArtifactStore, policy: &LoadPolicy) -> Result<Self, StartupError> {
        info!("Loading model artifacts from {}", store.dir().display());

        let mut attempt = 0;
        loop {
            let classifier = store
                .load_classifier()
                .map_err(StartupError::ClassifierUnavailable)?;

            let scaler = match store.load_scaler() {
                Ok(scaler) => scaler,
                Err(e) if policy.allow_scaler_fallback => {
                    let (params, source) = FallbackBootstrapper::scaler_or_bootstrap(Err(e))?;
                    return Ok(Self::from_parts(
                        params,
                        classifier.value,
                        source,
                        Some(classifier.meta),
                    ));
                }
                Err(e) => return Err(StartupError::ScalerUnavailable(e)),
            };

            match check_generation(&scaler.meta, &classifier.meta) {
                Ok(()) => {
                    info!(
                        "Loaded artifacts generation {} (trained {})",
                        classifier.meta.generation, classifier.meta.trained_at
                    );
                    return Ok(Self::from_parts(
                        scaler.value,
                        classifier.value,
                        ScalerSource::Artifact,
                        Some(classifier.meta),
                    ));
                }
                Err(e) if attempt < policy.load_retries => {
                    attempt += 1;
                    warn!("{}; retrying ({}/{})", e, attempt, policy.load_retries);
                    std::thread::sleep(Duration::from_millis(policy.retry_backoff_ms));
                }
                Err(e) => return Err(StartupError::ArtifactMismatch(e)),
            }
        }
    }

    /// Probability of the high-risk class for a raw feature vector
    pub(crate) fn probability(
        &self,
        vector: &FeatureVector,
    ) -> Result<(f64, ProbabilityBasis), InferenceError> {
        let standardized = self.scaler.transform(vector);

        if self.classifier.has_two_classes() {
            let p = self.classifier.predict_proba(&standardized)?;
            return Ok((p, ProbabilityBasis::VoteFraction));
        }

        // Single observed class: the forest can only ever return that label
        let class = self.classifier.predict_class(&standardized);
        warn!("Single-class classifier; reporting constant class {}", class);
        Ok((f64::from(class), ProbabilityBasis::SingleClass))
    }

    /// Fitted scaler
    pub fn scaler(&self) -> &ScalerParams {
        &self.scaler
    }

    /// Fitted classifier
    pub fn classifier(&self) -> &RandomForest {
        &self.classifier
    }

    /// Health report
    pub fn health(&self) -> &ModelHealth {
        &self.health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::Normalizer;
    use inference_engine::ForestConfig;
    use std::fs;

    fn fitted() -> (ScalerParams, RandomForest) {
        let x = vec![
            FeatureVector::new([62.0, 13.0, 36.4, 98.0, 110.0, 70.0, 21.0, 83.0]),
            FeatureVector::new([74.0, 15.0, 36.8, 97.0, 121.0, 79.0, 24.0, 93.0]),
            FeatureVector::new([112.0, 23.0, 38.6, 92.0, 152.0, 96.0, 28.0, 115.0]),
            FeatureVector::new([124.0, 25.0, 39.1, 90.0, 163.0, 101.0, 30.0, 122.0]),
        ];
        let (params, z) = Normalizer::fit_transform(&x).unwrap();
        let forest = RandomForest::fit(
            &z,
            &[0, 0, 1, 1],
            &ForestConfig {
                n_trees: 9,
                ..Default::default()
            },
        )
        .unwrap();
        (params, forest)
    }

    #[test]
    fn test_load_from_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (params, forest) = fitted();
        let meta = store.save(&params, &forest).unwrap();

        let state = ModelState::load(&store, &LoadPolicy::default()).unwrap();
        assert_eq!(state.health().scaler_source, ScalerSource::Artifact);
        assert_eq!(state.health().generation, Some(meta.generation));
        assert!(!state.health().is_degraded());
        assert_eq!(state.health().n_trees, 9);
    }

    #[test]
    fn test_missing_classifier_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            ModelState::load(&store, &LoadPolicy::default()),
            Err(StartupError::ClassifierUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_scaler_bootstraps() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (params, forest) = fitted();
        store.save(&params, &forest).unwrap();
        fs::remove_file(store.scaler_path()).unwrap();

        let state = ModelState::load(&store, &LoadPolicy::default()).unwrap();
        assert_eq!(state.health().scaler_source, ScalerSource::Bootstrapped);
        assert!(state.health().is_degraded());
        assert_eq!(state.scaler().n_samples(), 3);
    }

    fn write_raw<T: serde::Serialize>(path: &std::path::Path, meta: &ArtifactMeta, payload: &T) {
        let mut bytes = postcard::to_allocvec(meta).unwrap();
        bytes.extend(postcard::to_allocvec(payload).unwrap());
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_classifier_without_trees_is_fatal() {
        #[derive(serde::Serialize)]
        struct EmptyForest {
            trees: Vec<u8>,
            classes: Vec<u8>,
            config: ForestConfig,
        }

        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (params, forest) = fitted();
        let meta = store.save(&params, &forest).unwrap();
        let empty = EmptyForest {
            trees: vec![],
            classes: vec![0, 1],
            config: ForestConfig::default(),
        };
        write_raw(&store.classifier_path(), &meta, &empty);

        assert!(matches!(
            ModelState::load(&store, &LoadPolicy::default()),
            Err(StartupError::ClassifierUnavailable(_))
        ));
    }

    #[test]
    fn test_zero_std_scaler_bootstraps() {
        #[derive(serde::Serialize)]
        struct RawScaler {
            means: [f64; 8],
            std_devs: [f64; 8],
            floored: Vec<u8>,
            n_samples: usize,
        }

        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (params, forest) = fitted();
        let meta = store.save(&params, &forest).unwrap();
        let raw = RawScaler {
            means: *params.means(),
            std_devs: [0.0; 8],
            floored: vec![],
            n_samples: 4,
        };
        write_raw(&store.scaler_path(), &meta, &raw);

        let state = ModelState::load(&store, &LoadPolicy::default()).unwrap();
        assert_eq!(state.health().scaler_source, ScalerSource::Bootstrapped);

        let pipeline = crate::ScoringPipeline::new(std::sync::Arc::new(state));
        let assessment = pipeline
            .score_vector(&FeatureVector::new([75.0, 16.0, 36.8, 97.0, 120.0, 80.0, 24.0, 93.0]))
            .unwrap();
        assert!(assessment.probability.is_finite());
    }

    #[test]
    fn test_missing_scaler_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (params, forest) = fitted();
        store.save(&params, &forest).unwrap();
        fs::write(store.scaler_path(), b"corrupt").unwrap();

        let policy = LoadPolicy {
            allow_scaler_fallback: false,
            ..Default::default()
        };
        assert!(matches!(
            ModelState::load(&store, &policy),
            Err(StartupError::ScalerUnavailable(_))
        ));
    }

    #[test]
    fn test_persistent_generation_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (params, forest) = fitted();
        store.save(&params, &forest).unwrap();

        // A second store in a sibling directory provides a foreign scaler
        let other_dir = tempfile::tempdir().unwrap();
        let other = ArtifactStore::new(other_dir.path());
        other.save(&params, &forest).unwrap();
        fs::copy(other.scaler_path(), store.scaler_path()).unwrap();

        let policy = LoadPolicy {
            load_retries: 1,
            retry_backoff_ms: 1,
            ..Default::default()
        };
        assert!(matches!(
            ModelState::load(&store, &policy),
            Err(StartupError::ArtifactMismatch(_))
        ));
    }
}
