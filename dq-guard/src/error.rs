//! Error types for the dq-guard validation library.
//!
//! Errors are split into three kinds so callers can react differently:
//!
//! - [`ValidationError`]: the data violates a business rule. Fix the pipeline.
//! - [`SchemaError`]: a check was pointed at a column that does not exist or was
//!   given malformed parameters. Fix the test.
//! - [`ProviderError`]: fetching a table failed upstream of validation.
//!
//! All three are wrapped by [`GuardError`], the error type returned throughout
//! the crate.

use crate::verdict::Violation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for the dq-guard library.
#[derive(Error, Debug)]
pub enum GuardError {
    /// The data violates a data-quality rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The check itself was misconfigured.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A table provider failed to produce its table.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Coarse classification of a [`GuardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Schema,
    Provider,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Schema => write!(f, "schema"),
            ErrorKind::Provider => write!(f, "provider"),
        }
    }
}

impl GuardError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GuardError::Validation(_) => ErrorKind::Validation,
            GuardError::Schema(_) => ErrorKind::Schema,
            GuardError::Provider(_) => ErrorKind::Provider,
        }
    }

    /// Returns the validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            GuardError::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the schema error, if this is one.
    pub fn as_schema(&self) -> Option<&SchemaError> {
        match self {
            GuardError::Schema(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the provider error, if this is one.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self {
            GuardError::Provider(e) => Some(e),
            _ => None,
        }
    }
}

/// A data-quality rule was violated.
///
/// Carries the name of the failing check, a human-readable message and a
/// structured [`Violation`] describing the offending rows or values.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{check} failed: {message}")]
pub struct ValidationError {
    /// Name of the check that failed (e.g. `check_duplicates`)
    pub check: String,
    /// Human-readable failure message
    pub message: String,
    /// Structured description of what was violated
    pub violation: Violation,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(check: impl Into<String>, message: impl Into<String>, violation: Violation) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
            violation,
        }
    }
}

/// A check was asked to inspect something that does not exist, or was given
/// parameters of the wrong shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The named column is not part of the table.
    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// A parameter had the wrong shape (e.g. a scalar where a list is required).
    #[error("{argument} must be {expected}, got {found}")]
    InvalidArgument {
        argument: String,
        expected: String,
        found: String,
    },

    /// A column value cannot be compared with a range bound.
    #[error("Column '{column}' value {value} is not comparable with bound {bound}")]
    TypeMismatch {
        column: String,
        value: String,
        bound: String,
    },

    /// A table could not be constructed from the given columns and rows.
    #[error("Invalid table: {0}")]
    InvalidTable(String),
}

impl SchemaError {
    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

/// A source or target data provider failed.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Could not connect to the data store.
    #[error("Connection to {target} failed: {message}")]
    Connection {
        target: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The query could not be executed.
    #[error("Query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No data files were found at the path.
    #[error("No parquet files found at: {path}")]
    NotFound { path: String },

    /// Files were found but could not be read.
    #[error("Failed to read data from {path} ({read} read, {failed} failed): {message}")]
    Read {
        path: String,
        read: usize,
        failed: usize,
        message: String,
    },

    /// Provider configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Creates a query error with an underlying cause.
    pub fn query_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a connection error with an underlying cause.
    pub fn connection_with_source(
        target: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Connection {
            target: target.into(),
            message: message.into(),
            source: Some(source),
        }
    }
}

impl From<datafusion::error::DataFusionError> for GuardError {
    fn from(e: datafusion::error::DataFusionError) -> Self {
        GuardError::Provider(ProviderError::DataFusion(e))
    }
}

impl From<arrow::error::ArrowError> for GuardError {
    fn from(e: arrow::error::ArrowError) -> Self {
        GuardError::Provider(ProviderError::Arrow(e))
    }
}

impl From<std::io::Error> for GuardError {
    fn from(e: std::io::Error) -> Self {
        GuardError::Provider(ProviderError::Io(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err: GuardError = SchemaError::column_not_found("email").into();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.as_schema().is_some());
        assert!(err.as_validation().is_none());
        assert_eq!(err.to_string(), "Column 'email' not found in table");

        let err: GuardError = ProviderError::NotFound {
            path: "/data/x".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.to_string(), "No parquet files found at: /data/x");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("check_not_empty", "Table is empty", Violation::Empty);
        assert_eq!(err.to_string(), "check_not_empty failed: Table is empty");
        let err: GuardError = err.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = SchemaError::InvalidArgument {
            argument: "allowed_values".to_string(),
            expected: "a list".to_string(),
            found: "string".to_string(),
        };
        assert_eq!(err.to_string(), "allowed_values must be a list, got string");
    }

    #[test]
    fn test_datafusion_error_is_provider_kind() {
        let err: GuardError =
            datafusion::error::DataFusionError::Plan("bad plan".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Provider);
    }
}
