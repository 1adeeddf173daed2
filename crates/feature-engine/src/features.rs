//! Feature Vector Schema

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 8;

/// Position of each vital sign inside a [`FeatureVector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalSign {
    /// Heart rate (bpm)
    HeartRate,
    /// Respiratory rate (breaths/min)
    RespiratoryRate,
    /// Body temperature (°C)
    BodyTemperature,
    /// Oxygen saturation (%)
    OxygenSaturation,
    /// Systolic blood pressure (mmHg)
    SystolicBp,
    /// Diastolic blood pressure (mmHg)
    DiastolicBp,
    /// Body mass index (kg/m²)
    Bmi,
    /// Mean arterial pressure (mmHg)
    Map,
}

impl VitalSign {
    /// All vital signs in schema order
    pub const ALL: [VitalSign; FEATURE_DIMENSION] = [
        VitalSign::HeartRate,
        VitalSign::RespiratoryRate,
        VitalSign::BodyTemperature,
        VitalSign::OxygenSaturation,
        VitalSign::SystolicBp,
        VitalSign::DiastolicBp,
        VitalSign::Bmi,
        VitalSign::Map,
    ];

    /// Position in the feature vector
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Vital sign at a schema position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Column name used by the tabular training dataset
    pub fn column_name(&self) -> &'static str {
        match self {
            VitalSign::HeartRate => "Heart Rate",
            VitalSign::RespiratoryRate => "Respiratory Rate",
            VitalSign::BodyTemperature => "Body Temperature",
            VitalSign::OxygenSaturation => "Oxygen Saturation",
            VitalSign::SystolicBp => "Systolic Blood Pressure",
            VitalSign::DiastolicBp => "Diastolic Blood Pressure",
            VitalSign::Bmi => "Derived_BMI",
            VitalSign::Map => "Derived_MAP",
        }
    }

    /// Short identifier for logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalSign::HeartRate => "heart_rate",
            VitalSign::RespiratoryRate => "respiratory_rate",
            VitalSign::BodyTemperature => "body_temperature",
            VitalSign::OxygenSaturation => "oxygen_saturation",
            VitalSign::SystolicBp => "systolic_bp",
            VitalSign::DiastolicBp => "diastolic_bp",
            VitalSign::Bmi => "bmi",
            VitalSign::Map => "map",
        }
    }

    /// Measurement unit
    pub fn unit(&self) -> &'static str {
        match self {
            VitalSign::HeartRate => "bpm",
            VitalSign::RespiratoryRate => "breaths/min",
            VitalSign::BodyTemperature => "°C",
            VitalSign::OxygenSaturation => "%",
            VitalSign::SystolicBp | VitalSign::DiastolicBp | VitalSign::Map => "mmHg",
            VitalSign::Bmi => "kg/m²",
        }
    }
}

/// Feature vector for ML inference
///
/// Values are stored in [`VitalSign::ALL`] order. The fixed-size array
/// makes the eight-value contract part of the type; finiteness is checked
/// by the validator before a vector is built from request input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Raw feature values
    pub values: [f64; FEATURE_DIMENSION],
}

impl FeatureVector {
    /// Create a feature vector from schema-ordered values
    pub fn new(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self { values }
    }

    /// Value of a single vital sign
    pub fn get(&self, sign: VitalSign) -> f64 {
        self.values[sign.index()]
    }

    /// Values as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(vital sign, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (VitalSign, f64)> + '_ {
        VitalSign::ALL.iter().copied().zip(self.values.iter().copied())
    }

    /// Whether every value is finite
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; FEATURE_DIMENSION]> for FeatureVector {
    fn from(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self::new(values)
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl Index<VitalSign> for FeatureVector {
    type Output = f64;

    fn index(&self, sign: VitalSign) -> &f64 {
        &self.values[sign.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order() {
        for (i, sign) in VitalSign::ALL.iter().enumerate() {
            assert_eq!(sign.index(), i);
            assert_eq!(VitalSign::from_index(i), Some(*sign));
        }
        assert_eq!(VitalSign::from_index(FEATURE_DIMENSION), None);
    }

    #[test]
    fn test_named_access() {
        let v = FeatureVector::new([75.0, 16.0, 36.8, 97.0, 120.0, 80.0, 24.0, 93.0]);
        assert_eq!(v.get(VitalSign::HeartRate), 75.0);
        assert_eq!(v[VitalSign::OxygenSaturation], 97.0);
        assert_eq!(v[7], 93.0);
        assert!(v.is_finite());
    }

    #[test]
    fn test_non_finite_detected() {
        let mut v = FeatureVector::default();
        v.values[2] = f64::NAN;
        assert!(!v.is_finite());
    }

    #[test]
    fn test_column_names_unique() {
        let mut names: Vec<_> = VitalSign::ALL.iter().map(|s| s.column_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), FEATURE_DIMENSION);
    }
}
