//! Labeled training dataset and CSV loading

use crate::TrainingError;
use feature_engine::{FeatureVector, VitalSign, FEATURE_DIMENSION};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Categorical risk column of the tabular dataset
pub const RISK_CATEGORY_COLUMN: &str = "Risk Category";

/// Marker that makes a category high risk
const HIGH_RISK_MARKER: &str = "High";

/// Rows of vitals with binary risk labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingDataset {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<u8>,
}

impl TrainingDataset {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `[healthy, high-risk]` row counts
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for &label in &self.labels {
            counts[usize::from(label.min(1))] += 1;
        }
        counts
    }

    /// Append a labeled row
    pub fn push(&mut self, features: FeatureVector, label: u8) {
        self.features.push(features);
        self.labels.push(label);
    }

    /// Load a CSV file with the eight vital-sign columns
    pub fn load_csv(path: &Path) -> Result<Self, TrainingError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TrainingError::DatasetNotFound(path.display().to_string()),
            _ => TrainingError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })?;
        let dataset = Self::from_csv_reader(file)?;
        info!("Dataset loaded from {}: {} rows", path.display(), dataset.len());
        Ok(dataset)
    }

    /// Parse CSV from any reader
    ///
    /// Rows with a missing or non-numeric vital sign are dropped, including
    /// rows cut short before a vital-sign column. Label is 1
    /// iff the risk category contains "High"; without that column every
    /// row is labeled 0.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv.headers()?.clone();

        let mut columns = [0usize; FEATURE_DIMENSION];
        for (slot, sign) in columns.iter_mut().zip(VitalSign::ALL.iter()) {
            *slot = headers
                .iter()
                .position(|h| h == sign.column_name())
                .ok_or(TrainingError::MissingColumn(sign.column_name()))?;
        }
        let risk_column = headers.iter().position(|h| h == RISK_CATEGORY_COLUMN);
        if risk_column.is_none() {
            warn!(
                "Column {:?} not found; labeling every row as healthy",
                RISK_CATEGORY_COLUMN
            );
        }

        let mut dataset = Self::default();
        let mut dropped = 0usize;
        for record in csv.records() {
            let record = record?;

            let mut values = [0.0; FEATURE_DIMENSION];
            let complete = columns.iter().zip(values.iter_mut()).all(|(&col, slot)| {
                match record.get(col).and_then(|s| s.parse::<f64>().ok()) {
                    Some(v) if v.is_finite() => {
                        *slot = v;
                        true
                    }
                    _ => false,
                }
            });
            if !complete {
                dropped += 1;
                continue;
            }

            let label = risk_column
                .and_then(|col| record.get(col))
                .map_or(0, |category| u8::from(category.contains(HIGH_RISK_MARKER)));
            dataset.push(FeatureVector::new(values), label);
        }

        if dropped > 0 {
            debug!("Dropped {} rows with missing vital signs", dropped);
        }
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Patient ID,Heart Rate,Respiratory Rate,Body Temperature,Oxygen Saturation,Systolic Blood Pressure,Diastolic Blood Pressure,Derived_BMI,Derived_MAP,Risk Category";

    #[test]
    fn test_parse_with_risk_category() {
        let data = format!(
            "{}\n1,75,16,36.8,97,120,80,24,93.3,Low Risk\n2,118,23,38.9,91,158,99,29,118.7,High Risk\n",
            HEADER
        );
        let ds = TrainingDataset::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels, vec![0, 1]);
        assert_eq!(ds.features[1].get(VitalSign::Map), 118.7);
        assert_eq!(ds.class_counts(), [1, 1]);
    }

    #[test]
    fn test_label_match_is_case_sensitive_substring() {
        let data = format!(
            "{}\n1,75,16,36.8,97,120,80,24,93,high risk\n2,75,16,36.8,97,120,80,24,93,VeryHigh\n",
            HEADER
        );
        let ds = TrainingDataset::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.labels, vec![0, 1]);
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let data = format!(
            "{}\n1,75,,36.8,97,120,80,24,93,Low Risk\n2,abc,16,36.8,97,120,80,24,93,High Risk\n3,80,17,36.9,98,118,78,23,91,Low Risk\n",
            HEADER
        );
        let ds = TrainingDataset::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.features[0].get(VitalSign::HeartRate), 80.0);
    }

    #[test]
    fn test_short_rows_dropped() {
        let data = format!(
            "{}\n1,75,16,36.8,97,120,80,24,93,Low Risk\n2,118,23\n3,118,23,38.9,91,158,99,29,118.7,High Risk\n",
            HEADER
        );
        let ds = TrainingDataset::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels, vec![0, 1]);
    }

    #[test]
    fn test_missing_trailing_category_labels_zero() {
        let data = format!("{}\n1,118,23,38.9,91,158,99,29,118.7\n", HEADER);
        let ds = TrainingDataset::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.labels, vec![0]);
    }

    #[test]
    fn test_missing_risk_column_labels_zero() {
        let data = "Heart Rate,Respiratory Rate,Body Temperature,Oxygen Saturation,Systolic Blood Pressure,Diastolic Blood Pressure,Derived_BMI,Derived_MAP\n120,22,39,92,160,100,28,120\n";
        let ds = TrainingDataset::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(ds.labels, vec![0]);
    }

    #[test]
    fn test_missing_feature_column() {
        let data = "Heart Rate,Respiratory Rate\n75,16\n";
        assert!(matches!(
            TrainingDataset::from_csv_reader(data.as_bytes()),
            Err(TrainingError::MissingColumn("Body Temperature"))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            TrainingDataset::load_csv(&path),
            Err(TrainingError::DatasetNotFound(_))
        ));
    }
}
