//! Error types for form compilation, validation and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Schema-authoring errors raised while compiling a form.
///
/// These are never caught by the validation cycle: a schema that triggers
/// one of them needs fixing, not retrying.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("field '{field}' has no x-jsf-presentation.inputType (strict input type is enabled)")]
    MissingInputType { field: String },

    #[error("field '{field}' has unsupported array items: items must be an object schema")]
    UnsupportedArrayItems { field: String },

    #[error("schema nesting exceeds {limit} levels at field '{field}'")]
    DepthExceeded { field: String, limit: usize },

    #[error(transparent)]
    Validator(#[from] ValidatorError),
}

impl FormError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors reported by a [`crate::Validator`] implementation.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

/// Errors while loading schema or values documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn form_error_names_field() {
        let err = FormError::MissingInputType {
            field: "address.street".into(),
        };
        assert!(err.to_string().contains("'address.street'"));
        assert_eq!(err.exit_code(), 2);

        let err = FormError::UnsupportedArrayItems {
            field: "tags".into(),
        };
        assert!(err.to_string().contains("'tags'"));
    }

    #[test]
    fn validator_error_is_transparent() {
        let err: FormError = ValidatorError::InvalidSchema {
            message: "bad type".into(),
        }
        .into();
        assert_eq!(err.to_string(), "invalid schema: bad type");
    }
}
