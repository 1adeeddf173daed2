//! Artifact Storage
//!
//! Persists the fitted scaler and classifier as two opaque blobs that
//! share a training generation, replacing each file atomically.

mod store;

pub use store::{
    check_generation, ArtifactMeta, ArtifactPair, ArtifactStore, Loaded, CLASSIFIER_ARTIFACT,
    FORMAT_VERSION, SCALER_ARTIFACT,
};

use thiserror::Error;
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("Invalid artifact {path}: {message}")]
    InvalidArtifact { path: String, message: String },
    #[error("Artifact generation mismatch: scaler {scaler}, classifier {classifier}")]
    GenerationMismatch { scaler: Uuid, classifier: Uuid },
}
