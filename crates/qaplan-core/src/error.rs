//! Error taxonomy for the export model.
//!
//! Scoring has no error type: it never fails.

/// Errors produced while serializing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("json serialization failed: {0}")]
    Json(#[source] serde_json::Error),

    #[error("yaml serialization failed: {0}")]
    Yaml(#[source] serde_yaml::Error),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ExportError::Json(source);
        assert!(err.to_string().starts_with("json serialization failed"));
    }
}
