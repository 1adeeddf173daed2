//! Feature Validator for the Vital-Sign Contract

use crate::error::ValidationError;
use feature_engine::{FeatureVector, VitalSign, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw input token as received at the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Already numeric
    Number(f64),
    /// Text that still needs parsing
    Text(String),
}

impl RawValue {
    /// Parse into a finite float
    fn to_finite(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(v) => *v,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Validator for raw vital-sign input
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureValidator;

impl FeatureValidator {
    /// Validate raw tokens and build a feature vector
    pub fn validate(raw: &[RawValue]) -> Result<FeatureVector, ValidationError> {
        if raw.len() != FEATURE_DIMENSION {
            return Err(ValidationError::InvalidFeatureCount {
                expected: FEATURE_DIMENSION,
                actual: raw.len(),
            });
        }

        let mut values = [0.0; FEATURE_DIMENSION];
        for (index, (slot, token)) in values.iter_mut().zip(raw).enumerate() {
            *slot = token
                .to_finite()
                .ok_or_else(|| ValidationError::InvalidFeatureValue {
                    index,
                    feature: VitalSign::ALL[index].as_str(),
                    token: token.to_string(),
                })?;
        }

        Ok(FeatureVector::new(values))
    }
}
