//! Error types for Orchestra operations

use crate::validation::ValidationErrors;
use thiserror::Error;

/// A schema declaration that cannot be evaluated.
///
/// These are programmer errors, raised while building a [`crate::Schema`],
/// never while validating a payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema {schema}: field '{field}' declared more than once")]
    DuplicateField { schema: String, field: String },

    #[error("schema {schema}: field '{field}' has an empty name segment")]
    EmptyFieldName { schema: String, field: String },

    #[error("schema {schema}: field '{field}' has inverted bounds ({min} > {max})")]
    InvertedBounds {
        schema: String,
        field: String,
        min: String,
        max: String,
    },

    #[error("schema {schema}: enum field '{field}' declares no variants")]
    EmptyEnum { schema: String, field: String },

    #[error("schema {schema}: default for field '{field}' does not satisfy its own rules: {reason}")]
    InvalidDefault {
        schema: String,
        field: String,
        reason: String,
    },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend failed during {operation}: {reason}")]
    Backend { operation: String, reason: String },

    #[error("Connection pool error: {reason}")]
    Pool { reason: String },

    #[error("Stored {entity} row is corrupt: {reason}")]
    CorruptRow { entity: &'static str, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Migration failed: {reason}")]
    Migration { reason: String },
}

impl StorageError {
    /// Shorthand for a backend failure during a named operation.
    pub fn backend(operation: impl Into<String>, reason: impl ToString) -> Self {
        StorageError::Backend {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

/// Master error type for all Orchestra errors.
#[derive(Debug, Clone, Error)]
pub enum OrchestraError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl From<ValidationErrors> for OrchestraError {
    fn from(errors: ValidationErrors) -> Self {
        OrchestraError::Validation(errors)
    }
}

/// Result type for Orchestra operations.
pub type OrchestraResult<T> = Result<T, OrchestraError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldError;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::backend("agent_insert", "connection reset");
        assert_eq!(
            err.to_string(),
            "Storage backend failed during agent_insert: connection reset"
        );
    }

    #[test]
    fn test_validation_errors_convert() {
        let errors = ValidationErrors::from(vec![FieldError::new("name", "Required")]);
        let err: OrchestraError = errors.into();
        assert!(matches!(err, OrchestraError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("name: Required"));
    }
}
