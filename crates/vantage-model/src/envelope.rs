//! Uniform response envelope for the external boundary.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// JSON envelope returned by every boundary operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Encodes a failure as `<Tag>: <message>`. The message must already be
    /// free of filesystem paths.
    pub fn err(error: &PipelineError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(format!("{}: {error}", error.tag())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_shape() {
        let env = ApiEnvelope::ok(42);
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, "{\"success\":true,\"data\":42}");
    }

    #[test]
    fn err_envelope_carries_tag() {
        let env: ApiEnvelope<()> =
            ApiEnvelope::err(&PipelineError::UnknownDomain("gaming".to_string()));
        assert!(!env.success);
        assert!(env.error.unwrap().starts_with("UnknownDomain:"));
    }
}
