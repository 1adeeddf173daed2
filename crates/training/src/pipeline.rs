//! Training pipeline: dataset -> scaler -> forest -> artifacts

use crate::dataset::TrainingDataset;
use crate::synthetic::SyntheticConfig;
use crate::TrainingError;
use data_validator::{Normalizer, ScalerParams};
use inference_engine::{ForestConfig, RandomForest};
use scoring::diagnostics::{self, DiagnosticReport};
use scoring::{ModelState, ScalerSource, ScoringPipeline};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{ArtifactMeta, ArtifactStore};
use tracing::{info, warn};

/// Where training rows come from
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Tabular dataset on disk
    Csv {
        path: PathBuf,
        /// Generate synthetic data when the file does not exist
        fallback_to_synthetic: bool,
    },
    /// Two seeded Gaussian clusters
    Synthetic(SyntheticConfig),
}

impl DatasetSource {
    /// CSV source that falls back to the default synthetic set
    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::Csv {
            path: path.into(),
            fallback_to_synthetic: true,
        }
    }
}

/// Summary of one training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub class_counts: [usize; 2],
    /// Accuracy on the training rows
    pub accuracy: f64,
    pub classes: Vec<u8>,
    pub synthetic: bool,
    pub diagnostics: DiagnosticReport,
}

/// Fitted scaler and classifier with their report
#[derive(Debug, Clone)]
pub struct TrainedModels {
    pub scaler: ScalerParams,
    pub classifier: RandomForest,
    pub report: TrainingReport,
}

/// Offline trainer
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    pub forest: ForestConfig,
    /// Used when a CSV source falls back to synthetic rows
    pub synthetic: SyntheticConfig,
}

impl TrainingPipeline {
    /// Create a trainer with a forest configuration
    pub fn new(forest: ForestConfig) -> Self {
        Self {
            forest,
            synthetic: SyntheticConfig::default(),
        }
    }

    fn load(&self, source: &DatasetSource) -> Result<(TrainingDataset, bool), TrainingError> {
        match source {
            DatasetSource::Csv {
                path,
                fallback_to_synthetic,
            } => match TrainingDataset::load_csv(path) {
                Ok(dataset) => Ok((dataset, false)),
                Err(TrainingError::DatasetNotFound(p)) if *fallback_to_synthetic => {
                    warn!("Dataset {} not found, generating synthetic data", p);
                    Ok((self.synthetic.generate()?, true))
                }
                Err(e) => Err(e),
            },
            DatasetSource::Synthetic(config) => Ok((config.generate()?, true)),
        }
    }

    /// Fit the scaler and the forest on the source rows
    pub fn train(&self, source: &DatasetSource) -> Result<TrainedModels, TrainingError> {
        let (dataset, synthetic) = self.load(source)?;
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        let class_counts = dataset.class_counts();
        info!(
            "Training on {} rows ({} healthy, {} high-risk)",
            dataset.len(),
            class_counts[0],
            class_counts[1]
        );
        if class_counts[0] == 0 || class_counts[1] == 0 {
            warn!("Training data has a single class; probabilities will be unavailable");
        }

        let (scaler, scaled) = Normalizer::fit_transform(&dataset.features)?;
        let classifier = RandomForest::fit(&scaled, &dataset.labels, &self.forest)?;
        let accuracy = classifier.accuracy(&scaled, &dataset.labels);
        info!(
            "Trained {} trees, training accuracy {:.2}%",
            classifier.n_trees(),
            accuracy * 100.0
        );

        let probe = ScoringPipeline::new(Arc::new(ModelState::from_parts(
            scaler.clone(),
            classifier.clone(),
            ScalerSource::Artifact,
            None,
        )));
        let diagnostics = diagnostics::run(&probe)?;

        let report = TrainingReport {
            samples: dataset.len(),
            class_counts,
            accuracy,
            classes: classifier.classes().to_vec(),
            synthetic,
            diagnostics,
        };

        Ok(TrainedModels {
            scaler,
            classifier,
            report,
        })
    }

    /// Train and write both artifacts under one generation
    pub fn train_and_save(
        &self,
        source: &DatasetSource,
        store: &ArtifactStore,
    ) -> Result<(TrainedModels, ArtifactMeta), TrainingError> {
        let models = self.train(source)?;
        let meta = store.save(&models.scaler, &models.classifier)?;
        Ok((models, meta))
    }
}
