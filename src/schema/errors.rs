//! # Schema Errors
//!
//! Error types for validation, document build, hooks and the model boundary.

use serde_json::Value;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema and document-mapping errors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A declared field's value failed its type check
    #[error("model '{model}': field '{field}' expected {expected}, got {value}")]
    Validation {
        /// Owning model name
        model: String,
        /// Field key that failed
        field: String,
        /// Declared type label
        expected: String,
        /// Offending value, as given
        value: Value,
    },

    /// A document build was aborted; wraps the validation failure
    #[error("model '{model}': document build failed: {source}")]
    Build {
        /// Owning model name
        model: String,
        /// The failure that aborted the build
        #[source]
        source: Box<SchemaError>,
    },

    /// Build source was not a JSON object
    #[error("model '{model}': build source must be an object, got {actual}")]
    NotAnObject {
        /// Owning model name
        model: String,
        /// JSON type name of the source
        actual: &'static str,
    },

    /// A pre-operation hook callback failed
    #[error("hook '{operation}' failed: {message}")]
    Hook {
        /// Operation name the hook was registered under
        operation: String,
        /// Failure description from the callback
        message: String,
    },

    /// The backing store reported a failure during resolution
    #[error("store error: {0}")]
    Store(String),
}

impl SchemaError {
    /// Create a validation error for one field
    pub fn validation(
        model: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        value: &Value,
    ) -> Self {
        Self::Validation {
            model: model.into(),
            field: field.into(),
            expected: expected.into(),
            value: value.clone(),
        }
    }

    /// Wrap a failure as a build abort for the named model
    pub fn build(model: impl Into<String>, cause: SchemaError) -> Self {
        Self::Build {
            model: model.into(),
            source: Box::new(cause),
        }
    }

    /// Create a hook failure
    pub fn hook(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a store failure
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Returns whether this error aborted a document build
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::Build { .. })
    }
}
