//! Shared error taxonomy for the pipeline.
//!
//! Every variant carries a short stable tag and a human-readable message.
//! Messages surfaced to callers must not leak filesystem paths.

use thiserror::Error;

use crate::enums::CleaningOperation;

/// Error type shared across the pipeline crates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Neither extension nor declared content type matches a known format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// The selected parser could not decode the file.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// Unknown cleaning strategy token or out-of-range setting.
    #[error("invalid cleaning configuration: {0}")]
    Config(String),
    /// A cleaning stage failed; downstream stages are not executed.
    #[error("{operation} stage failed: {message}")]
    Stage {
        operation: CleaningOperation,
        message: String,
    },
    /// An operation was invoked before its inputs were ready.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// The requested domain is not in the KPI library.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
    /// The valid-relationship set is empty at view-generation time.
    #[error(
        "no valid relationships found; upload related files or confirm relationships manually"
    )]
    NoRelationshipsFound,
    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// I/O error from file operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable short tag, used in the response envelope and audit records.
    pub fn tag(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat(_) => "UnsupportedFormat",
            PipelineError::MalformedInput(_) => "MalformedInput",
            PipelineError::Config(_) => "ConfigError",
            PipelineError::Stage { .. } => "StageError",
            PipelineError::PreconditionFailed(_) => "PreconditionFailed",
            PipelineError::UnknownDomain(_) => "UnknownDomain",
            PipelineError::NoRelationshipsFound => "NoRelationshipsFound",
            PipelineError::NotFound(_) => "NotFound",
            PipelineError::Io(_) => "IoError",
        }
    }

    /// True when the failure is a caller mistake rather than an internal
    /// fault, mapping to a 4xx-style response.
    pub fn is_validation(&self) -> bool {
        !matches!(self, PipelineError::Io(_) | PipelineError::Stage { .. })
    }
}

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(
            PipelineError::UnknownDomain("x".to_string()).tag(),
            "UnknownDomain"
        );
        assert_eq!(PipelineError::NoRelationshipsFound.tag(), "NoRelationshipsFound");
        let stage = PipelineError::Stage {
            operation: CleaningOperation::Imputation,
            message: "boom".to_string(),
        };
        assert_eq!(stage.tag(), "StageError");
        assert!(stage.to_string().contains("imputation"));
    }

    #[test]
    fn validation_classification() {
        assert!(PipelineError::Config("bad".to_string()).is_validation());
        assert!(!PipelineError::Io(std::io::Error::other("disk")).is_validation());
    }
}
