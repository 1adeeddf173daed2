//! Data Validation and Normalization
//!
//! Provides input validation for the eight-value vital-sign contract and
//! z-score normalization fitted on training data.

mod error;
mod normalizer;
mod validator;

pub use error::{ScalerError, ValidationError};
pub use normalizer::{Normalizer, ScalerParams, MIN_STD_DEV};
pub use validator::{FeatureValidator, RawValue};
