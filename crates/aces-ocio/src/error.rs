//! Error types for configuration assembly and serialization.
//!
//! This module provides error handling for:
//! - Transform step validation and composition
//! - Color space registration (name collisions, unknown references)
//! - Builder state transitions
//! - The ordered consistency check run before serialization
//! - Reading and writing the persisted document

use std::fmt;
use thiserror::Error;

/// Result type for configuration operations.
pub type OcioResult<T> = Result<T, OcioError>;

/// Errors that can occur while assembling or persisting a configuration.
#[derive(Debug, Error)]
pub enum OcioError {
    /// A transform step names a kind the composer does not know.
    #[error("unsupported transform kind: {kind}")]
    UnsupportedTransformKind {
        /// The offending kind label.
        kind: String,
    },

    /// A transform step of a known kind carries malformed parameters.
    #[error("invalid transform: {reason}")]
    InvalidTransform {
        /// Description of what's wrong.
        reason: String,
    },

    /// A color space with this exact name is already registered.
    #[error("duplicate color space name: {name}")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A display, view or role points at a name absent from the registry.
    #[error("unknown color space: {name}")]
    UnknownColorSpace {
        /// Name of the missing color space.
        name: String,
    },

    /// A display or view name that cannot be persisted as written.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// What's wrong with it.
        reason: String,
    },

    /// A role key outside the fixed role set.
    #[error("unknown role: {role}")]
    UnknownRole {
        /// The unrecognized key.
        role: String,
    },

    /// The builder was already finalized and is read-only.
    #[error("configuration already finalized")]
    AlreadyFinalized,

    /// The consistency check rejected the configuration.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// I/O error reading or writing a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML encode/decode error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OcioError {
    /// Shorthand for [`OcioError::InvalidTransform`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            reason: reason.into(),
        }
    }

    /// Returns the validation failure, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// One step of the consistency check, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidationStep {
    /// Reference space present and carrying no reference transforms.
    ReferenceSpace,
    /// Registry names are unique.
    UniqueNames,
    /// Every display/view target resolves.
    DisplayViews,
    /// Every set role target resolves.
    Roles,
    /// Active displays and views are populated when needed.
    ActiveLists,
}

impl ValidationStep {
    /// All steps in the order the checker runs them.
    pub const ALL: [ValidationStep; 5] = [
        Self::ReferenceSpace,
        Self::UniqueNames,
        Self::DisplayViews,
        Self::Roles,
        Self::ActiveLists,
    ];

    /// 1-based position of the step.
    #[inline]
    pub fn number(self) -> u8 {
        match self {
            Self::ReferenceSpace => 1,
            Self::UniqueNames => 2,
            Self::DisplayViews => 3,
            Self::Roles => 4,
            Self::ActiveLists => 5,
        }
    }

    /// Short label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::ReferenceSpace => "reference space",
            Self::UniqueNames => "unique names",
            Self::DisplayViews => "display/view targets",
            Self::Roles => "role targets",
            Self::ActiveLists => "active displays/views",
        }
    }
}

impl fmt::Display for ValidationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

/// A failed consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed at step {step}: {detail}")]
pub struct ValidationError {
    /// The step that failed.
    pub step: ValidationStep,
    /// Human-readable detail.
    pub detail: String,
}

impl ValidationError {
    /// Creates a validation error for a step.
    pub fn new(step: ValidationStep, detail: impl Into<String>) -> Self {
        Self {
            step,
            detail: detail.into(),
        }
    }
}
