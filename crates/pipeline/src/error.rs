//! Planning-stage error taxonomy.

use panelforge_core::error::CoreError;
use panelforge_textgen::TextGenError;

/// Why a planning stage failed. Both variants are fatal at the failing
/// stage's scope: the whole job for macro planning, the page for shot
/// planning.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The capability produced output that conforms to JSON but not to
    /// the plan contract (wrong count, bad numbering, missing fields).
    #[error("Planning output rejected: {0}")]
    Schema(String),

    /// The capability could not be reached or refused the call.
    #[error("Planning capability unavailable: {0}")]
    Capability(String),
}

impl From<TextGenError> for PlanError {
    fn from(err: TextGenError) -> Self {
        match err {
            TextGenError::SchemaViolation(message) => PlanError::Schema(message),
            TextGenError::Unavailable(message) => PlanError::Capability(message),
        }
    }
}

impl From<CoreError> for PlanError {
    fn from(err: CoreError) -> Self {
        PlanError::Schema(err.to_string())
    }
}
