//! Error types for the generation pipeline.
//!
//! Collaborator failures (discovery, LUT rendering, baking, manifests) are
//! input rejections; core failures are wrapped unchanged.

use std::path::PathBuf;
use thiserror::Error;

use aces_ocio::OcioError;

/// Result type for pipeline operations.
pub type GenResult<T> = Result<T, GenError>;

/// Errors raised while generating a configuration.
#[derive(Debug, Error)]
pub enum GenError {
    /// Transform definitions could not be discovered.
    #[error("discovery failed in {root}: {reason}")]
    Discovery {
        /// Directory being scanned.
        root: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A lookup table could not be rendered.
    #[error("LUT materialization failed for {transform_id}: {reason}")]
    Materialization {
        /// Transform the table was rendered from.
        transform_id: String,
        /// What went wrong.
        reason: String,
    },

    /// An interchange LUT could not be baked.
    #[error("bake failed for {target}: {reason}")]
    Bake {
        /// Output file of the failed job.
        target: String,
        /// What went wrong.
        reason: String,
    },

    /// A vendor manifest is malformed.
    #[error("invalid manifest {path}: {reason}")]
    Manifest {
        /// Manifest file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Configuration assembly failed.
    #[error(transparent)]
    Core(#[from] OcioError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML decode error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
