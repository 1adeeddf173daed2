//! Degraded-Mode Fallback
//!
//! Provides a usable scaler fitted on built-in seed vitals when the
//! persisted scaler artifact cannot be loaded.

mod bootstrap;

pub use bootstrap::{seed_dataset, FallbackBootstrapper, ScalerSource, SEED_VITALS};
