//! Risk Scoring Pipeline
//!
//! Orchestrates validation, standardization and forest classification into
//! a 0–100 risk score with a coarse status. Model state is loaded once and
//! shared read-only across concurrent requests.

pub mod diagnostics;
mod error;
mod pipeline;
mod state;

pub use error::{ErrorClass, ScoringError, StartupError};
pub use pipeline::{ProbabilityBasis, RiskAssessment, RiskStatus, ScoringPipeline};
pub use state::{LoadPolicy, ModelHealth, ModelState};

pub use data_validator::RawValue;
pub use fallback::ScalerSource;
