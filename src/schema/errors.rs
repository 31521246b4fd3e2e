//! Schema compile error types
//!
//! Error codes:
//! - AERO_SCHEMA_SYNTAX (malformed DSL text)
//! - AERO_SCHEMA_UNKNOWN_REFERENCE (undefined or wrong-kind schema name)
//! - AERO_SCHEMA_FIELD_REFERENCE (expression names an unknown or later field)
//! - AERO_SCHEMA_DUPLICATE_FIELD
//! - AERO_SCHEMA_DUPLICATE_SCHEMA
//! - AERO_SCHEMA_INVALID_FIELD (bad bit width, alignment, regex, encoding)
//! - AERO_SCHEMA_SOURCE_UNREADABLE (schema file or directory I/O)
//!
//! All of these fail registry construction; none is deferred to decode time.

use std::fmt;

/// Schema compile error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    AeroSchemaSyntax,
    AeroSchemaUnknownReference,
    AeroSchemaFieldReference,
    AeroSchemaDuplicateField,
    AeroSchemaDuplicateSchema,
    AeroSchemaInvalidField,
    AeroSchemaSourceUnreadable,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::AeroSchemaSyntax => "AERO_SCHEMA_SYNTAX",
            SchemaErrorCode::AeroSchemaUnknownReference => "AERO_SCHEMA_UNKNOWN_REFERENCE",
            SchemaErrorCode::AeroSchemaFieldReference => "AERO_SCHEMA_FIELD_REFERENCE",
            SchemaErrorCode::AeroSchemaDuplicateField => "AERO_SCHEMA_DUPLICATE_FIELD",
            SchemaErrorCode::AeroSchemaDuplicateSchema => "AERO_SCHEMA_DUPLICATE_SCHEMA",
            SchemaErrorCode::AeroSchemaInvalidField => "AERO_SCHEMA_INVALID_FIELD",
            SchemaErrorCode::AeroSchemaSourceUnreadable => "AERO_SCHEMA_SOURCE_UNREADABLE",
        }
    }

    /// Returns the error class name used in query-facing messages
    pub fn class_name(&self) -> &'static str {
        match self {
            SchemaErrorCode::AeroSchemaUnknownReference => "UnknownSchemaReferenceError",
            SchemaErrorCode::AeroSchemaSourceUnreadable => "SchemaSourceError",
            _ => "SchemaCompileError",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema compile error with source location
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Schema being compiled, if known
    schema: Option<String>,
    /// Field being compiled, if known
    field: Option<String>,
    /// 1-based line and column in the DSL source
    location: Option<(usize, usize)>,
    /// File path or label of the source text
    origin: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            schema: None,
            field: None,
            location: None,
            origin: None,
        }
    }

    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::AeroSchemaSyntax, message).at(line, column)
    }

    /// Nested or `as` reference to a schema that does not exist
    pub fn unknown_reference(name: &str) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaUnknownReference,
            format!("schema '{}' is not defined", name),
        )
    }

    /// Reference to a schema of the wrong kind
    pub fn kind_mismatch(name: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaUnknownReference,
            format!("schema '{}' is {}, expected a {} schema", name, actual, expected),
        )
    }

    /// Expression refers to a field not declared earlier
    pub fn unknown_field(name: &str) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaFieldReference,
            format!("'{}' does not name an earlier field", name),
        )
    }

    pub fn duplicate_field(name: &str) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaDuplicateField,
            format!("field '{}' is declared more than once", name),
        )
    }

    pub fn duplicate_schema(name: &str) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaDuplicateSchema,
            format!("schema '{}' is already defined", name),
        )
    }

    pub fn invalid_field(message: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::AeroSchemaInvalidField, message)
    }

    pub fn unreadable(path: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            SchemaErrorCode::AeroSchemaSourceUnreadable,
            format!("cannot read '{}': {}", path, reason),
        )
    }

    /// Attaches the schema name unless one is already set
    pub fn in_schema(mut self, schema: &str) -> Self {
        if self.schema.is_none() {
            self.schema = Some(schema.to_string());
        }
        self
    }

    /// Attaches the field name unless one is already set
    pub fn in_field(mut self, field: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
        }
        self
    }

    /// Attaches a source location unless one is already set
    pub fn at(mut self, line: usize, column: usize) -> Self {
        if self.location.is_none() {
            self.location = Some((line, column));
        }
        self
    }

    /// Attaches the source origin unless one is already set
    pub fn in_origin(mut self, origin: &str) -> Self {
        if self.origin.is_none() {
            self.origin = Some(origin.to_string());
        }
        self
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn location(&self) -> Option<(usize, usize)> {
        self.location
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.code.class_name(), self.code.code())?;
        if let Some(ref schema) = self.schema {
            write!(f, "schema '{}' ", schema)?;
        }
        if let Some(ref field) = self.field {
            write!(f, "field '{}' ", field)?;
        }
        match (&self.origin, self.location) {
            (Some(origin), Some((line, column))) => write!(f, "at {}:{}:{} ", origin, line, column)?,
            (Some(origin), None) => write!(f, "in {} ", origin)?,
            (None, Some((line, column))) => write!(f, "at {}:{} ", line, column)?,
            (None, None) => {}
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema compilation
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::AeroSchemaSyntax.code(), "AERO_SCHEMA_SYNTAX");
        assert_eq!(
            SchemaErrorCode::AeroSchemaUnknownReference.class_name(),
            "UnknownSchemaReferenceError"
        );
    }

    #[test]
    fn test_context_is_sticky() {
        let err = SchemaError::unknown_field("Count")
            .in_field("Values")
            .in_schema("P")
            .in_schema("Other")
            .at(3, 14);
        assert_eq!(err.schema(), Some("P"));
        assert_eq!(err.field(), Some("Values"));
        assert_eq!(err.location(), Some((3, 14)));

        let display = err.to_string();
        assert!(display.contains("AERO_SCHEMA_FIELD_REFERENCE"));
        assert!(display.contains("schema 'P'"));
        assert!(display.contains("3:14"));
    }

    #[test]
    fn test_kind_mismatch_is_reference_error() {
        let err = SchemaError::kind_mismatch("Line", "binary", "text");
        assert_eq!(err.code(), SchemaErrorCode::AeroSchemaUnknownReference);
        assert!(err.message().contains("'Line'"));
    }
}
