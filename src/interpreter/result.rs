//! Result wrappers for the non-throwing entry points

use serde::Serialize;

use crate::cursor::DecodeError;

use super::value::{Record, Value};

/// Outcome of a `try_*` decode: success flag plus the record on success
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TryParseResult {
    pub is_success: bool,
    pub result: Option<Record>,
}

impl TryParseResult {
    pub fn success(record: Record) -> Self {
        Self {
            is_success: true,
            result: Some(record),
        }
    }

    pub fn failure() -> Self {
        Self {
            is_success: false,
            result: None,
        }
    }
}

/// Outcome of a `partial_*` decode
///
/// `result` always holds a full record; fields not reached before the
/// failure are at their type default. `parsed_fields` lists only the
/// fields that were actually decoded, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialParseResult {
    pub is_success: bool,
    pub result: Record,
    pub error_message: Option<String>,
    pub parsed_fields: Vec<(String, Value)>,
    #[serde(skip)]
    pub error: Option<DecodeError>,
}

impl PartialParseResult {
    /// `parsed_fields` excludes fields skipped by `when`, even though the
    /// record carries them at their default.
    pub fn success(record: Record, parsed_fields: Vec<(String, Value)>) -> Self {
        Self {
            is_success: true,
            result: record,
            error_message: None,
            parsed_fields,
            error: None,
        }
    }

    pub fn failure(record: Record, parsed_fields: Vec<(String, Value)>, error: DecodeError) -> Self {
        Self {
            is_success: false,
            result: record,
            error_message: Some(error.to_string()),
            parsed_fields,
            error: Some(error),
        }
    }

    /// Looks up a decoded field by name
    pub fn parsed(&self, name: &str) -> Option<&Value> {
        self.parsed_fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_result_shapes() {
        let ok = TryParseResult::success(Record::new("A"));
        assert!(ok.is_success);
        assert!(ok.result.is_some());

        let err = TryParseResult::failure();
        assert!(!err.is_success);
        assert!(err.result.is_none());
    }

    #[test]
    fn test_partial_success_keeps_given_fields() {
        let mut record = Record::new("A");
        record.push("X", Value::Byte(1));
        record.push("Skipped", Value::Int(0));
        let partial = PartialParseResult::success(record, vec![("X".to_string(), Value::Byte(1))]);
        assert!(partial.is_success);
        assert_eq!(partial.parsed("X"), Some(&Value::Byte(1)));
        assert_eq!(partial.parsed("Skipped"), None);
        assert_eq!(partial.result.get("Skipped"), Some(&Value::Int(0)));
        assert!(partial.error_message.is_none());
    }

    #[test]
    fn test_partial_failure_keeps_message() {
        let error = DecodeError::insufficient_bytes(2, 4, 1).with_field("Body");
        let partial = PartialParseResult::failure(Record::new("A"), Vec::new(), error);
        assert!(!partial.is_success);
        let message = partial.error_message.unwrap();
        assert!(message.contains("Body"));
        assert!(message.contains("AERO_DECODE_STRUCTURAL"));
    }
}
