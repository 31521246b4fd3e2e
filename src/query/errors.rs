//! # Query Errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::cursor::DecodeError;
use crate::schema::SchemaError;

/// Result type for query entry points
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Schema '{name}' is a {actual} schema, {expected} required")]
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Unknown field path: {0}")]
    UnknownField(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueryError {
    /// Stable code for the error class
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownSchema(_) => "AERO_QUERY_UNKNOWN_SCHEMA",
            QueryError::KindMismatch { .. } => "AERO_QUERY_KIND_MISMATCH",
            QueryError::UnknownField(_) => "AERO_QUERY_UNKNOWN_FIELD",
            QueryError::Decode(e) => e.code().code(),
            QueryError::Schema(e) => e.code().code(),
            QueryError::Config(_) => "AERO_QUERY_CONFIG",
        }
    }

    /// The decode error, when decoding is what failed
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            QueryError::Decode(e) => Some(e),
            _ => None,
        }
    }
}
