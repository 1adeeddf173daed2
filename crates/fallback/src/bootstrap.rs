//! Seed Scaler Bootstrap

use data_validator::{Normalizer, ScalerError, ScalerParams};
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{info, warn};

/// Representative low / typical / high vitals used to fit the fallback scaler
pub const SEED_VITALS: [[f64; FEATURE_DIMENSION]; 3] = [
    [60.0, 12.0, 36.1, 99.0, 100.0, 60.0, 18.5, 73.3],
    [75.0, 16.0, 36.8, 97.0, 120.0, 80.0, 24.0, 93.3],
    [120.0, 24.0, 39.0, 90.0, 160.0, 100.0, 30.0, 120.0],
];

/// Where the serving scaler came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerSource {
    /// Loaded from the persisted artifact
    Artifact,
    /// Fitted on [`SEED_VITALS`]; statistics are not representative
    Bootstrapped,
}

impl ScalerSource {
    /// Whether serving runs in degraded accuracy mode
    pub fn is_degraded(&self) -> bool {
        matches!(self, ScalerSource::Bootstrapped)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalerSource::Artifact => "artifact",
            ScalerSource::Bootstrapped => "bootstrapped",
        }
    }
}

/// Seed rows as feature vectors
pub fn seed_dataset() -> [FeatureVector; 3] {
    SEED_VITALS.map(FeatureVector::new)
}

/// Builds the degraded-mode scaler
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackBootstrapper;

impl FallbackBootstrapper {
    /// Fit a scaler on the built-in seed rows
    pub fn bootstrap_scaler() -> Result<ScalerParams, ScalerError> {
        warn!(
            "Bootstrapping scaler from {} seed rows; scoring runs in degraded mode",
            SEED_VITALS.len()
        );
        Normalizer::fit(&seed_dataset())
    }

    /// Use a loaded scaler, or bootstrap one if loading failed
    pub fn scaler_or_bootstrap<E: Display>(
        loaded: Result<ScalerParams, E>,
    ) -> Result<(ScalerParams, ScalerSource), ScalerError> {
        match loaded {
            Ok(params) => {
                info!("Using persisted scaler ({} fitted rows)", params.n_samples());
                Ok((params, ScalerSource::Artifact))
            }
            Err(e) => {
                warn!("Scaler artifact unavailable: {}", e);
                let params = Self::bootstrap_scaler()?;
                Ok((params, ScalerSource::Bootstrapped))
            }
        }
    }
}
