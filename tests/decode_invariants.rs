//! Decode Invariant Tests
//!
//! End-to-end behaviour of the binary entry points:
//! - Primitive layout and byte order
//! - Counted arrays driven by earlier fields
//! - Conditional fields
//! - Partial decodes keep everything before the failure
//! - Cursor reads are all-or-nothing

use std::sync::Arc;
use std::thread;

use aerolayout::cursor::{ByteCursor, DecodeErrorCode, Encoding};
use aerolayout::{DecodeConfig, QueryError, QueryFunctions, SchemaRegistry, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn functions(source: &str) -> QueryFunctions {
    let registry = SchemaRegistry::compile(source).unwrap();
    QueryFunctions::new(Arc::new(registry))
}

fn le_ints(count: u8, values: &[i32]) -> Vec<u8> {
    let mut data = vec![count];
    for v in values {
        data.extend_from_slice(&v.to_le_bytes());
    }
    data
}

// =============================================================================
// End-to-End Layouts
// =============================================================================

#[test]
fn test_header_layout() {
    let functions = functions("binary H { Magic: int le, Version: short le, Flags: byte }");
    let record = functions
        .interpret(&[0x78, 0x56, 0x34, 0x12, 0x00, 0x01, 0xFF], "H")
        .unwrap();

    assert_eq!(record.get("Magic"), Some(&Value::Int(0x12345678)));
    assert_eq!(record.get("Version"), Some(&Value::Short(0x0100)));
    assert_eq!(record.get("Flags"), Some(&Value::Byte(0xFF)));
    assert_eq!(
        record.to_json(),
        json!({"Magic": 0x12345678, "Version": 256, "Flags": 255})
    );
}

#[test]
fn test_count_drives_array_length() {
    let functions = functions("binary P { Count: byte, Values: int[Count] le }");

    let record = functions.interpret(&le_ints(2, &[10, 20]), "P").unwrap();
    assert_eq!(
        record.get("Values"),
        Some(&Value::Array(vec![Value::Int(10), Value::Int(20)]))
    );

    let mut data = le_ints(1, &[10, 20]);
    data.truncate(5);
    let record = functions.interpret(&data, "P").unwrap();
    assert_eq!(record.get("Values"), Some(&Value::Array(vec![Value::Int(10)])));

    let record = functions.interpret(&[0], "P").unwrap();
    assert_eq!(record.get("Values"), Some(&Value::Array(vec![])));
}

#[test]
fn test_array_longer_than_input_fails_before_reading() {
    let functions = functions("binary P { Count: byte, Values: int[Count] le }");
    let err = functions.interpret(&le_ints(3, &[1, 2]), "P").unwrap_err();
    let decode = err.as_decode().unwrap();
    assert_eq!(decode.code(), DecodeErrorCode::AeroDecodeStructural);
    assert_eq!(decode.field(), Some("Values"));
    assert_eq!(decode.position(), 1);
}

#[test]
fn test_conditional_payload() {
    let functions = functions(
        "binary M { HasPayload: byte, Payload: int le when HasPayload <> 0, Tail: byte }",
    );

    let absent = functions.interpret(&[0, 0xAA], "M").unwrap();
    assert_eq!(absent.get("Payload"), Some(&Value::Int(0)));
    assert_eq!(absent.get("Tail"), Some(&Value::Byte(0xAA)));

    let present = functions.interpret(&[1, 5, 0, 0, 0, 0xAA], "M").unwrap();
    assert_eq!(present.get("Payload"), Some(&Value::Int(5)));
    assert_eq!(present.get("Tail"), Some(&Value::Byte(0xAA)));
}

#[test]
fn test_partial_success_omits_skipped_fields() {
    let functions = functions(
        "binary M { HasPayload: byte, Payload: int le when HasPayload <> 0, Tail: byte }",
    );
    let partial = functions.partial_interpret(&[0, 0xAA], "M").unwrap();

    assert!(partial.is_success);
    let names: Vec<&str> = partial.parsed_fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["HasPayload", "Tail"]);
    assert_eq!(partial.result.get("Payload"), Some(&Value::Int(0)));
}

#[test]
fn test_align_after_far_seek_is_structural_error() {
    let functions = functions("binary A { O: ulong le, _: align[16] at O }");
    let mut data = u64::MAX.to_le_bytes().to_vec();
    data.push(1);

    let outcome = functions.try_interpret(&data, "A").unwrap();
    assert!(!outcome.is_success);
    assert!(outcome.result.is_none());

    let err = functions.interpret(&data, "A").unwrap_err();
    assert_eq!(err.as_decode().unwrap().code(), DecodeErrorCode::AeroDecodeStructural);
}

#[test]
fn test_partial_interpret_stops_at_third_field() {
    let functions = functions("binary R { A: byte, B: ushort le, C: long le, D: byte }");
    let partial = functions.partial_interpret(&[1, 2, 0, 3, 4], "R").unwrap();

    assert!(!partial.is_success);
    let names: Vec<&str> = partial.parsed_fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert!(partial.error_message.as_deref().unwrap().contains("'C'"));
    assert_eq!(partial.result.get("B"), Some(&Value::UShort(2)));
    assert_eq!(partial.result.get("C"), Some(&Value::Long(0)));
}

#[test]
fn test_try_interpret_never_errors_on_bad_input() {
    let functions = functions("binary H { Magic: int le }");
    let result = functions.try_interpret(&[1, 2], "H").unwrap();
    assert!(!result.is_success);
    assert!(result.result.is_none());

    let result = functions.try_interpret(&[1, 2, 3, 4], "H").unwrap();
    assert!(result.is_success);
}

#[test]
fn test_nested_error_paths() {
    let functions = functions(
        "binary Inner { Magic: uint be };
         binary Outer { Header: Inner, Body: byte[2] }",
    );
    let err = functions.interpret(&[0, 0], "Outer").unwrap_err();
    assert_eq!(err.as_decode().unwrap().field(), Some("Header.Magic"));
    assert!(err.to_string().contains("Header.Magic"));
}

#[test]
fn test_default_endianness_from_config() {
    let config = DecodeConfig::from_json_str(r#"{"default_endianness": "be"}"#).unwrap();
    let functions = QueryFunctions::from_source("binary W { V: ushort, L: ushort le }", config).unwrap();
    let record = functions.interpret(&[0x01, 0x02, 0x01, 0x02], "W").unwrap();
    assert_eq!(record.get("V"), Some(&Value::UShort(0x0102)));
    assert_eq!(record.get("L"), Some(&Value::UShort(0x0201)));
}

#[test]
fn test_array_limit_from_config() {
    let config = DecodeConfig::from_json_str(r#"{"max_array_elements": 4}"#).unwrap();
    let functions = QueryFunctions::from_source("binary P { N: byte, V: byte[N], W: short[N] }", config).unwrap();

    // Byte blobs are bounded by the input, not the element limit
    let mut data = vec![5u8];
    data.extend_from_slice(&[0; 15]);
    let err = functions.interpret(&data, "P").unwrap_err();
    let decode = err.as_decode().unwrap();
    assert_eq!(decode.code(), DecodeErrorCode::AeroDecodeLimitExceeded);
    assert_eq!(decode.field(), Some("W"));
}

#[test]
fn test_check_rejects_value() {
    let functions = functions("binary V { Version: byte check Version >= 1 and Version <= 3 }");
    assert!(functions.interpret(&[2], "V").is_ok());
    let err = functions.interpret(&[9], "V").unwrap_err();
    assert_eq!(
        err.as_decode().unwrap().code(),
        DecodeErrorCode::AeroDecodeValidationFailed
    );
}

#[test]
fn test_unknown_schema_is_binding_error() {
    let functions = functions("binary H { A: byte }");
    assert!(matches!(
        functions.partial_interpret(&[1], "Nope"),
        Err(QueryError::UnknownSchema(_))
    ));
}

#[test]
fn test_concurrent_decodes_share_registry() {
    let functions = Arc::new(functions("binary P { Count: byte, Values: int[Count] le }"));
    let handles: Vec<_> = (0..4u8)
        .map(|n| {
            let functions = Arc::clone(&functions);
            thread::spawn(move || {
                let values: Vec<i32> = (0..n as i32).collect();
                let record = functions.interpret(&le_ints(n, &values), "P").unwrap();
                record.get("Values").unwrap().as_array().unwrap().len()
            })
        })
        .collect();

    let lengths: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(lengths, vec![0, 1, 2, 3]);
    assert_eq!(functions.metrics().snapshot().decodes_succeeded, 4);
}

// =============================================================================
// Cursor Properties
// =============================================================================

#[test]
fn test_endianness_mirror() {
    let bytes = [0x11, 0x22, 0x33, 0x44];
    let mut reversed = bytes;
    reversed.reverse();

    let le = ByteCursor::new(&bytes).read_i32_le().unwrap();
    let be = ByteCursor::new(&reversed).read_i32_be().unwrap();
    assert_eq!(le, be);
}

#[test]
fn test_short_reads_leave_cursor_untouched() {
    let data = [1u8, 2, 3];
    let mut cursor = ByteCursor::new(&data);
    cursor.read_byte().unwrap();
    let before = cursor.state();

    assert_eq!(
        cursor.read_bytes(3).unwrap_err().code(),
        DecodeErrorCode::AeroDecodeStructural
    );
    assert_eq!(cursor.state(), before);
    assert!(cursor.read_string(5, Encoding::Utf8).is_err());
    assert_eq!(cursor.state(), before);
    assert_eq!(cursor.read_bytes(2).unwrap(), vec![2, 3]);
}

#[test]
fn test_bits_reconstruct_byte() {
    for byte in [0x00u8, 0x5A, 0xA5, 0xFF, 0x81] {
        let data = [byte];
        let mut bits = ByteCursor::new(&data);
        let mut value = 0u8;
        for _ in 0..8 {
            value = (value << 1) | bits.read_bits(1).unwrap() as u8;
        }
        assert_eq!(value, ByteCursor::new(&data).read_byte().unwrap());
        assert!(bits.is_at_end());
    }
}

#[test]
fn test_align_after_residual_bits() {
    let data = [0xFF, 0x01, 0x02];
    let mut cursor = ByteCursor::new(&data);
    cursor.read_bits(3).unwrap();
    cursor.align_to_bits(8).unwrap();
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.bit_offset(), 0);

    cursor.align_to_bits(8).unwrap();
    assert_eq!(cursor.position(), 1);
}
