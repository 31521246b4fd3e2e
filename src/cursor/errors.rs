//! Decode error types following the AERO_* error code convention
//!
//! Error codes:
//! - AERO_DECODE_STRUCTURAL (not enough bytes/chars, negative length)
//! - AERO_DECODE_DELIMITER_NOT_FOUND (missing delimiter or required whitespace)
//! - AERO_DECODE_PATTERN_MISMATCH (regex does not match at the cursor)
//! - AERO_DECODE_LITERAL_MISMATCH (expected literal absent)
//! - AERO_DECODE_VALIDATION_FAILED (explicit checks, bad expression values)
//! - AERO_DECODE_BIT_RANGE (bit count or alignment out of range)
//! - AERO_DECODE_LIMIT_EXCEEDED (array or nesting limits)
//!
//! Every error carries the cursor position and, once the interpreter has
//! attached it, the dotted path of the field being decoded.

use std::fmt;

/// Decode error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorCode {
    /// Insufficient input for the requested read
    AeroDecodeStructural,
    /// `until`/`between` delimiter or required whitespace missing
    AeroDecodeDelimiterNotFound,
    /// Pattern did not match at the cursor
    AeroDecodePatternMismatch,
    /// Literal did not match at the cursor
    AeroDecodeLiteralMismatch,
    /// Explicit validation failed
    AeroDecodeValidationFailed,
    /// Bit count or alignment out of range
    AeroDecodeBitRange,
    /// Configured decode limit exceeded
    AeroDecodeLimitExceeded,
}

impl DecodeErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            DecodeErrorCode::AeroDecodeStructural => "AERO_DECODE_STRUCTURAL",
            DecodeErrorCode::AeroDecodeDelimiterNotFound => "AERO_DECODE_DELIMITER_NOT_FOUND",
            DecodeErrorCode::AeroDecodePatternMismatch => "AERO_DECODE_PATTERN_MISMATCH",
            DecodeErrorCode::AeroDecodeLiteralMismatch => "AERO_DECODE_LITERAL_MISMATCH",
            DecodeErrorCode::AeroDecodeValidationFailed => "AERO_DECODE_VALIDATION_FAILED",
            DecodeErrorCode::AeroDecodeBitRange => "AERO_DECODE_BIT_RANGE",
            DecodeErrorCode::AeroDecodeLimitExceeded => "AERO_DECODE_LIMIT_EXCEEDED",
        }
    }

    /// Returns the error class name used in query-facing messages
    pub fn class_name(&self) -> &'static str {
        match self {
            DecodeErrorCode::AeroDecodeStructural => "StructuralError",
            DecodeErrorCode::AeroDecodeDelimiterNotFound => "DelimiterNotFoundError",
            DecodeErrorCode::AeroDecodePatternMismatch => "PatternMismatchError",
            DecodeErrorCode::AeroDecodeLiteralMismatch => "LiteralMismatchError",
            DecodeErrorCode::AeroDecodeValidationFailed => "ValidationError",
            DecodeErrorCode::AeroDecodeBitRange => "BitRangeError",
            DecodeErrorCode::AeroDecodeLimitExceeded => "LimitExceededError",
        }
    }
}

impl fmt::Display for DecodeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Decode error with field and position context
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    /// Error code
    code: DecodeErrorCode,
    /// Dotted path of the failing field, once known
    field: Option<String>,
    /// Cursor position (bytes or chars) where the failure was detected
    position: usize,
    /// Human-readable message
    message: String,
}

impl DecodeError {
    fn new(code: DecodeErrorCode, position: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            position,
            message: message.into(),
        }
    }

    /// Not enough bytes left for a read
    pub fn insufficient_bytes(position: usize, required: usize, available: usize) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeStructural,
            position,
            format!("requires {} bytes, {} available", required, available),
        )
    }

    /// Not enough characters left for a read
    pub fn insufficient_chars(position: usize, required: usize, available: usize) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeStructural,
            position,
            format!("requires {} characters, {} available", required, available),
        )
    }

    /// A length or count evaluated to a negative number
    pub fn negative_length(position: usize, value: i128) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeStructural,
            position,
            format!("length or count must not be negative, got {}", value),
        )
    }

    /// Delimiter not found before end of input
    pub fn delimiter_not_found(position: usize, delimiter: &str) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeDelimiterNotFound,
            position,
            format!("delimiter '{}' not found", delimiter),
        )
    }

    /// Required whitespace missing at the cursor
    pub fn whitespace_required(position: usize) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeDelimiterNotFound,
            position,
            "required whitespace not found",
        )
    }

    /// Pattern did not match at the cursor
    pub fn pattern_mismatch(position: usize, pattern: &str) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodePatternMismatch,
            position,
            format!("pattern '{}' does not match at cursor", pattern),
        )
    }

    /// Literal did not match at the cursor
    pub fn literal_mismatch(position: usize, expected: &str) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeLiteralMismatch,
            position,
            format!("expected literal '{}'", expected),
        )
    }

    /// Explicit validation failure
    pub fn validation_failed(field: &str, position: usize, message: impl Into<String>) -> Self {
        Self::new(DecodeErrorCode::AeroDecodeValidationFailed, position, message).with_field(field)
    }

    /// Decoded data could not be used as required (e.g. non-numeric count)
    pub fn invalid_value(position: usize, message: impl Into<String>) -> Self {
        Self::new(DecodeErrorCode::AeroDecodeValidationFailed, position, message)
    }

    /// Bit count outside 1..=64
    pub fn bit_count_out_of_range(position: usize, bit_count: u32) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeBitRange,
            position,
            format!("bit count must be between 1 and 64, got {}", bit_count),
        )
    }

    /// Alignment not one of 8, 16, 32, 64
    pub fn invalid_alignment(position: usize, bits: u32) -> Self {
        Self::new(
            DecodeErrorCode::AeroDecodeBitRange,
            position,
            format!("alignment must be 8, 16, 32 or 64 bits, got {}", bits),
        )
    }

    /// Configured limit exceeded
    pub fn limit_exceeded(position: usize, message: impl Into<String>) -> Self {
        Self::new(DecodeErrorCode::AeroDecodeLimitExceeded, position, message)
    }

    /// Attaches the failing field name unless one is already set
    pub fn with_field(mut self, field: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
        }
        self
    }

    /// Prefixes the field path with an enclosing field (nested decodes)
    pub fn within(mut self, parent: &str) -> Self {
        self.field = Some(match self.field.take() {
            Some(inner) => format!("{}.{}", parent, inner),
            None => parent.to_string(),
        });
        self
    }

    /// Returns the error code
    pub fn code(&self) -> DecodeErrorCode {
        self.code
    }

    /// Returns the failing field path, if known
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the cursor position of the failure
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the message without code or field context
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.code.class_name(), self.code.code())?;
        if let Some(ref field) = self.field {
            write!(f, "field '{}' ", field)?;
        }
        write!(f, "at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for DecodeError {}

/// Result type for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;
