//! Error type for library loading and validation.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("failed to parse embedded library {name}: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("library validation failed: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
