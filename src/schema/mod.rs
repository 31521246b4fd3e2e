//! Schema subsystem: DSL compiler and registry
//!
//! Layout descriptions are written in a small DSL:
//!
//! ```text
//! binary Header { Magic: int le, Version: short le, Flags: byte };
//! text Line { Key: until '=' trim, Value: rest };
//! ```
//!
//! and compiled once into an immutable [`SchemaRegistry`].
//!
//! `//` starts a comment anywhere. `--` starts one only at the start of
//! input or after whitespace, so `byte[A--1]` reads `A - -1` while
//! `Flags: byte -- reserved` ends in a comment. Delimiters of `until` and
//! `between`, and `literal` text, must be non-empty.
//!
//! # Design Principles
//!
//! - Compile errors fail registration; nothing is deferred to decode time
//! - Field kinds form a closed enum
//! - Schema and field references are resolved to indices at compile time
//! - Compiled schemas never change

mod errors;
mod expr;
mod lexer;
mod loader;
mod parser;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use expr::{BinaryOp, Expr, FieldRef, UnaryOp};
pub use loader::{SchemaLoader, SchemaSource, SCHEMA_EXTENSION};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use types::{
    BinaryFieldKind, Endianness, FieldKind, FieldSpec, PrimitiveType, SchemaDefinition, SchemaId,
    SchemaKind, SchemaRef, TextFieldKind, PLACEHOLDER,
};
