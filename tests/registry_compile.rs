//! Registry Compile Tests
//!
//! Compile-time guarantees of the schema registry:
//! - References resolve at build time, across sources
//! - Every compile error fails registration with a typed code
//! - Directory loading is deterministic

use std::fs;

use aerolayout::schema::{SchemaErrorCode, SchemaKind, SchemaRegistry};
use tempfile::TempDir;

fn compile_error(source: &str) -> SchemaErrorCode {
    SchemaRegistry::compile(source).unwrap_err().code()
}

// =============================================================================
// Reference Resolution
// =============================================================================

#[test]
fn test_unknown_nested_reference() {
    assert_eq!(
        compile_error("binary A { H: Missing }"),
        SchemaErrorCode::AeroSchemaUnknownReference
    );
}

#[test]
fn test_embedded_reference_must_match_kind() {
    assert_eq!(
        compile_error(
            "binary Bin { X: byte };
             binary Outer { S: string[4] as Bin }"
        ),
        SchemaErrorCode::AeroSchemaUnknownReference
    );
}

#[test]
fn test_forward_field_reference_rejected() {
    assert_eq!(
        compile_error("binary A { Data: byte[Len], Len: byte }"),
        SchemaErrorCode::AeroSchemaFieldReference
    );
    assert_eq!(
        compile_error("binary A { Data: byte[Data] }"),
        SchemaErrorCode::AeroSchemaFieldReference
    );
}

#[test]
fn test_duplicates_rejected() {
    assert_eq!(
        compile_error("binary A { X: byte, X: short }"),
        SchemaErrorCode::AeroSchemaDuplicateField
    );
    assert_eq!(
        compile_error("binary A { X: byte }; text A { Y: rest }"),
        SchemaErrorCode::AeroSchemaDuplicateSchema
    );
}

#[test]
fn test_placeholders_may_repeat() {
    let registry = SchemaRegistry::compile("binary A { _: byte, _: byte, X: byte }").unwrap();
    let names: Vec<&str> = registry
        .get("A")
        .unwrap()
        .output_fields()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["X"]);
}

#[test]
fn test_invalid_pattern_and_bit_width() {
    assert_eq!(
        compile_error("text T { P: pattern '(' }"),
        SchemaErrorCode::AeroSchemaInvalidField
    );
    assert_ne!(compile_error("binary B { F: bits[65] }"), SchemaErrorCode::AeroSchemaUnknownReference);
    assert_ne!(compile_error("binary B { F: align[12] }"), SchemaErrorCode::AeroSchemaUnknownReference);
}

#[test]
fn test_empty_delimiters_rejected() {
    for source in [
        "text T { A: between '' ')' nested }",
        "text T { A: between '(' '' }",
        "text T { A: until '' }",
        "text T { _: literal '' }",
    ] {
        assert_eq!(compile_error(source), SchemaErrorCode::AeroSchemaInvalidField, "{}", source);
    }
}

#[test]
fn test_syntax_error_location() {
    let err = SchemaRegistry::compile("binary A {\n  X byte }").unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::AeroSchemaSyntax);
    assert_eq!(err.location().map(|(line, _)| line), Some(2));
}

#[test]
fn test_comments_are_ignored() {
    let registry = SchemaRegistry::compile(
        "-- header layout\n\
         binary A { X: byte // first\n, Y: byte }",
    )
    .unwrap();
    assert_eq!(registry.get("A").unwrap().fields.len(), 2);
}

// =============================================================================
// Sources and Introspection
// =============================================================================

#[test]
fn test_cross_source_references() {
    let registry = SchemaRegistry::builder()
        .add_source("binary Outer { H: Inner }")
        .add_source("binary Inner { V: ushort }")
        .build()
        .unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.fixed_width("Outer"), Some(2));
}

#[test]
fn test_load_dir_reads_only_schema_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("b.schema"), "binary B { H: A, N: byte }").unwrap();
    fs::write(tmp.path().join("a.schema"), "binary A { V: int }").unwrap();
    fs::write(tmp.path().join("notes.txt"), "not a schema {").unwrap();

    let registry = SchemaRegistry::builder()
        .load_dir(tmp.path())
        .unwrap()
        .build()
        .unwrap();
    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names.len(), 2);
    assert!(registry.contains("A") && registry.contains("B"));
    assert_eq!(registry.fixed_width("B"), Some(5));
    assert_eq!(registry.get("B").unwrap().kind, SchemaKind::Binary);
}

#[test]
fn test_error_names_origin_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.schema");
    fs::write(&path, "binary A { X: Nope }").unwrap();

    let err = SchemaRegistry::builder()
        .add_file(&path)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(err.origin().unwrap().contains("broken.schema"));
    assert!(err.to_string().contains("Nope"));
}

#[test]
fn test_missing_dir_is_source_error() {
    let tmp = TempDir::new().unwrap();
    let err = SchemaRegistry::builder()
        .load_dir(&tmp.path().join("absent"))
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::AeroSchemaSourceUnreadable);
}

#[test]
fn test_fixed_width_of_variable_layouts() {
    let registry = SchemaRegistry::compile(
        "binary V { N: byte, D: byte[N] };
         binary C { F: int when 1 = 1 };
         binary L { A: long, B: double, C: int[4] }",
    )
    .unwrap();
    assert_eq!(registry.fixed_width("V"), None);
    assert_eq!(registry.fixed_width("C"), None);
    assert_eq!(registry.fixed_width("L"), Some(32));
}
