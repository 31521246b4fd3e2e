//! Text Parsing Tests
//!
//! Text entry points and text cursor semantics:
//! - Delimited, bracketed and pattern fields
//! - Nested/escaped `between`
//! - Zero-or-one optional whitespace
//! - Cross apply over parsed arrays

use std::sync::Arc;

use aerolayout::cursor::{BetweenOptions, DecodeErrorCode, TextCursor, TextModifiers};
use aerolayout::{QueryFunctions, SchemaRegistry, Value};

fn functions(source: &str) -> QueryFunctions {
    QueryFunctions::new(Arc::new(SchemaRegistry::compile(source).unwrap()))
}

// =============================================================================
// Cursor Semantics
// =============================================================================

#[test]
fn test_between_nested() {
    let mut cursor = TextCursor::new("[[inner]]");
    let options = BetweenOptions {
        nested: true,
        ..BetweenOptions::default()
    };
    assert_eq!(cursor.read_between("[", "]", options).unwrap(), "[inner]");
    assert!(cursor.is_at_end());
}

#[test]
fn test_between_escaped() {
    let mut cursor = TextCursor::new(r"[test\]]");
    let options = BetweenOptions {
        escaped: true,
        ..BetweenOptions::default()
    };
    assert_eq!(cursor.read_between("[", "]", options).unwrap(), r"test\]");
}

#[test]
fn test_optional_whitespace_takes_one() {
    let mut cursor = TextCursor::new("  hello");
    assert_eq!(cursor.skip_optional_whitespace(), " ");
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.skip_optional_whitespace(), " ");
    assert_eq!(cursor.skip_optional_whitespace(), "");
    assert_eq!(cursor.position(), 2);
}

#[test]
fn test_short_chars_read_is_atomic() {
    let mut cursor = TextCursor::new("abc");
    let err = cursor.read_chars(4, TextModifiers::NONE).unwrap_err();
    assert_eq!(err.code(), DecodeErrorCode::AeroDecodeStructural);
    assert_eq!(cursor.position(), 0);
    assert_eq!(cursor.read_chars(3, TextModifiers::NONE).unwrap(), "abc");
}

// =============================================================================
// Entry Points
// =============================================================================

#[test]
fn test_parse_request_line() {
    let functions = functions(
        "text Request {
             Method: token upper,
             _: whitespace,
             Path: until ' ',
             Version: pattern 'HTTP/\\d\\.\\d'
         }",
    );
    let record = functions.parse("get /index.html HTTP/1.1", "Request").unwrap();
    assert_eq!(record.get("Method"), Some(&Value::Text("GET".into())));
    assert_eq!(record.get("Path"), Some(&Value::Text("/index.html".into())));
    assert_eq!(record.get("Version"), Some(&Value::Text("HTTP/1.1".into())));
}

#[test]
fn test_pattern_mismatch_is_reported() {
    let functions = functions("text N { Digits: pattern '[0-9]+', Rest: rest }");
    let err = functions.parse("abc", "N").unwrap_err();
    let decode = err.as_decode().unwrap();
    assert_eq!(decode.code(), DecodeErrorCode::AeroDecodePatternMismatch);
    assert_eq!(decode.field(), Some("Digits"));
    assert_eq!(decode.position(), 0);
}

#[test]
fn test_try_parse_and_partial_parse() {
    let functions = functions("text Kv { Key: until '=', Value: until ';', Tail: rest }");

    let ok = functions.try_parse("a=1;x", "Kv").unwrap();
    assert!(ok.is_success);
    assert!(!functions.try_parse("a=1", "Kv").unwrap().is_success);

    let partial = functions.partial_parse("a=1", "Kv").unwrap();
    assert!(!partial.is_success);
    assert_eq!(partial.parsed_fields, vec![("Key".to_string(), Value::Text("a".into()))]);
    assert!(partial.error_message.unwrap().contains("'Value'"));
    assert_eq!(partial.result.get("Value"), Some(&Value::Null));
}

#[test]
fn test_cross_apply_over_parsed_items() {
    let functions = functions(
        "text Item { Name: until ',' trim };
         text Csv { Count: until ':', Items: Item[Count], Last: rest trim }",
    );
    let record = functions.parse("2: a , b ,c", "Csv").unwrap();
    let rows = QueryFunctions::cross_apply(&record, "Items").unwrap();
    let names: Vec<&str> = rows
        .iter()
        .map(|row| row.as_record().unwrap().get("Name").unwrap().as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(record.get("Last"), Some(&Value::Text("c".into())));
}

#[test]
fn test_multibyte_positions_are_chars() {
    let functions = functions("text T { A: chars[2], _: literal '!' }");
    let err = functions.parse("äöx", "T").unwrap_err();
    assert_eq!(err.as_decode().unwrap().position(), 2);
}
