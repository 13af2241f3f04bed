//! Storage error types for llmconf

use std::path::PathBuf;

use llmconf_providers::ProviderError;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A field value is out of bounds or malformed
    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    /// Unique name or id already taken
    #[error("Duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// File read/write failed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A persisted collection could not be decoded or encoded
    #[error("Failed to parse stored {key}: {message}")]
    Parse { key: String, message: String },

    /// No storage location could be determined
    #[error("Path resolution failed: {0}")]
    PathResolution(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl StorageError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        StorageError::Duplicate {
            kind,
            name: name.into(),
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        StorageError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn io(path: PathBuf, source: std::io::Error) -> Self {
        StorageError::Io { path, source }
    }

    pub fn parse(key: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Parse {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Field name of a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            StorageError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = StorageError::validation("topN", "must be an integer between 1 and 10");
        assert_eq!(err.field(), Some("topN"));
        assert_eq!(
            err.to_string(),
            "Invalid value for topN: must be an integer between 1 and 10"
        );
    }

    #[test]
    fn test_provider_error_converts() {
        let err: StorageError = ProviderError::InvalidModel("p/m".to_string()).into();
        assert!(matches!(err, StorageError::Provider(ProviderError::InvalidModel(_))));
        assert_eq!(err.to_string(), "Invalid model: p/m");
    }
}
