//! Failure taxonomy of the inference engine.
//!
//! None of these abort a run. `NotFound` means "no static information",
//! `Unanalyzable` and `IncompatibleOverride` degrade one construct or one
//! signal, and `UnitFailure` isolates a unit that failed unexpectedly.
//! All of them end up in the run's `AnalysisReport`.

use scry_types::TypeParseError;
use thiserror::Error;

use crate::definition::UnitId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("no declaration found for `{unit}`")]
    NotFound { unit: UnitId },

    #[error("`{unit}`: cannot analyze {construct}, treated as unknown")]
    Unanalyzable { unit: UnitId, construct: String },

    #[error("`{unit}`: invalid type in `@{tag}`: {source}")]
    IncompatibleOverride {
        unit: UnitId,
        tag: String,
        #[source]
        source: TypeParseError,
    },

    #[error("`{unit}`: analysis failed: {reason}")]
    UnitFailure { unit: UnitId, reason: String },
}

impl InferError {
    /// The unit the failure is attributed to.
    pub fn unit(&self) -> &UnitId {
        match self {
            Self::NotFound { unit }
            | Self::Unanalyzable { unit, .. }
            | Self::IncompatibleOverride { unit, .. }
            | Self::UnitFailure { unit, .. } => unit,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid inference configuration: {0}")]
    Json(#[from] serde_json::Error),
}
