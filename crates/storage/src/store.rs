//! Artifact Store Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use data_validator::ScalerParams;
use inference_engine::RandomForest;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Scaler blob file name
pub const SCALER_ARTIFACT: &str = "scaler.bin";
/// Classifier blob file name
pub const CLASSIFIER_ARTIFACT: &str = "risk_classifier.bin";
/// Current on-disk format version
pub const FORMAT_VERSION: u16 = 1;

/// Header written in front of every artifact payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// On-disk format version
    pub format_version: u16,
    /// Training run that produced the artifact
    pub generation: Uuid,
    /// When the training run finished
    pub trained_at: DateTime<Utc>,
}

impl ArtifactMeta {
    /// Header for a fresh training run
    pub fn new_generation() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: Uuid::new_v4(),
            trained_at: Utc::now(),
        }
    }
}

/// A decoded artifact with its header
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub meta: ArtifactMeta,
    pub value: T,
}

/// Scaler and classifier from the same generation
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub meta: ArtifactMeta,
    pub scaler: ScalerParams,
    pub classifier: RandomForest,
}

/// File-backed store for the two serving artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Directory holding both blobs
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the scaler blob
    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(SCALER_ARTIFACT)
    }

    /// Path of the classifier blob
    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join(CLASSIFIER_ARTIFACT)
    }

    /// Persist both artifacts under a new generation
    pub fn save(
        &self,
        scaler: &ScalerParams,
        classifier: &RandomForest,
    ) -> Result<ArtifactMeta, StorageError> {
        let meta = ArtifactMeta::new_generation();
        self.save_with_meta(&meta, scaler, classifier)?;
        Ok(meta)
    }

    /// Persist both artifacts with an explicit header
    pub fn save_with_meta(
        &self,
        meta: &ArtifactMeta,
        scaler: &ScalerParams,
        classifier: &RandomForest,
    ) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        write_atomic(&self.classifier_path(), &encode(meta, classifier)?)?;
        write_atomic(&self.scaler_path(), &encode(meta, scaler)?)?;

        info!(
            "Saved artifacts generation {} to {}",
            meta.generation,
            self.dir.display()
        );
        Ok(())
    }

    /// Load the scaler blob
    pub fn load_scaler(&self) -> Result<Loaded<ScalerParams>, StorageError> {
        let path = self.scaler_path();
        let loaded: Loaded<ScalerParams> = read_artifact(&path)?;
        loaded
            .value
            .validate()
            .map_err(|e| invalid_artifact(&path, e))?;
        Ok(loaded)
    }

    /// Load the classifier blob
    pub fn load_classifier(&self) -> Result<Loaded<RandomForest>, StorageError> {
        let path = self.classifier_path();
        let loaded: Loaded<RandomForest> = read_artifact(&path)?;
        loaded
            .value
            .validate()
            .map_err(|e| invalid_artifact(&path, e))?;
        Ok(loaded)
    }

    /// Load both blobs and require matching generations
    pub fn load_pair(&self) -> Result<ArtifactPair, StorageError> {
        let scaler = self.load_scaler()?;
        let classifier = self.load_classifier()?;
        check_generation(&scaler.meta, &classifier.meta)?;
        Ok(ArtifactPair {
            meta: classifier.meta,
            scaler: scaler.value,
            classifier: classifier.value,
        })
    }
}

/// Fail unless both headers come from the same training run
pub fn check_generation(scaler: &ArtifactMeta, classifier: &ArtifactMeta) -> Result<(), StorageError> {
    if scaler.generation != classifier.generation {
        return Err(StorageError::GenerationMismatch {
            scaler: scaler.generation,
            classifier: classifier.generation,
        });
    }
    Ok(())
}

fn encode<T: Serialize>(meta: &ArtifactMeta, payload: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = postcard::to_allocvec(meta)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    let body = postcard::to_allocvec(payload)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<Loaded<T>, StorageError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        _ => io_error(path, e),
    })?;

    let (meta, rest): (ArtifactMeta, _) = postcard::take_from_bytes(&bytes)
        .map_err(|e| StorageError::SerializationError(format!("{}: {}", path.display(), e)))?;
    if meta.format_version != FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: meta.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let value = postcard::from_bytes(rest)
        .map_err(|e| StorageError::SerializationError(format!("{}: {}", path.display(), e)))?;

    debug!(
        "Loaded {} ({} bytes, generation {})",
        path.display(),
        bytes.len(),
        meta.generation
    );
    Ok(Loaded { meta, value })
}

/// Write to a temp file in the same directory, then rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(path, e));
    }
    Ok(())
}

fn invalid_artifact(path: &Path, err: impl std::fmt::Display) -> StorageError {
    StorageError::InvalidArtifact {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
