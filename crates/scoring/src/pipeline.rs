//! Scoring Pipeline Implementation

use crate::error::ScoringError;
use crate::state::ModelState;
use data_validator::{FeatureValidator, RawValue};
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Probability above which a patient is flagged high risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.5;

/// Coarse risk status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    Stable,
    High,
}

impl RiskStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Stable => "Stable",
            RiskStatus::High => "High",
        }
    }
}

/// How the probability behind an assessment was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityBasis {
    /// Fraction of trees voting high risk
    VoteFraction,
    /// Classifier saw one class; probability is that class label
    SingleClass,
}

/// Result of scoring one set of vitals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Risk score in [0, 100]
    pub risk_score: u8,
    /// Coarse status
    pub status: RiskStatus,
    /// Underlying high-risk probability
    pub probability: f64,
    /// Where `probability` came from
    pub basis: ProbabilityBasis,
}

impl RiskAssessment {
    /// Derive score and status from a probability in [0, 1]
    pub fn from_probability(probability: f64, basis: ProbabilityBasis) -> Self {
        let risk_score = (probability * 100.0).round().clamp(0.0, 100.0) as u8;
        let status = if probability > HIGH_RISK_THRESHOLD {
            RiskStatus::High
        } else {
            RiskStatus::Stable
        };
        Self {
            risk_score,
            status,
            probability,
            basis,
        }
    }
}

/// Single entry point for scoring requests
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    state: Arc<ModelState>,
}

impl ScoringPipeline {
    /// Create a pipeline over loaded model state
    pub fn new(state: Arc<ModelState>) -> Self {
        Self { state }
    }

    /// Validate raw tokens and score them
    pub fn score(&self, raw: &[RawValue]) -> Result<RiskAssessment, ScoringError> {
        let vector = FeatureValidator::validate(raw)?;
        self.score_vector(&vector)
    }

    /// Score an already validated feature vector
    pub fn score_vector(&self, vector: &FeatureVector) -> Result<RiskAssessment, ScoringError> {
        let state = &self.state;
        let (probability, basis) =
            match panic::catch_unwind(AssertUnwindSafe(|| state.probability(vector))) {
                Ok(result) => result?,
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    error!("Panic during inference: {}", msg);
                    return Err(ScoringError::Internal(msg));
                }
            };

        if !(0.0..=1.0).contains(&probability) {
            error!("Classifier produced invalid probability {}", probability);
            return Err(ScoringError::Internal(format!(
                "classifier produced invalid probability {}",
                probability
            )));
        }

        let assessment = RiskAssessment::from_probability(probability, basis);
        debug!(
            "Scored vitals: p={:.3} score={} status={}",
            probability,
            assessment.risk_score,
            assessment.status.as_str()
        );
        Ok(assessment)
    }

    /// Shared model state
    pub fn state(&self) -> &ModelState {
        &self.state
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
