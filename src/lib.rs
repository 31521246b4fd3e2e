//! aerolayout - A strict, deterministic structural decoder
//!
//! Describes binary and text record layouts in a small DSL and decodes raw
//! bytes or strings into ordered records:
//!
//! ```
//! use std::sync::Arc;
//! use aerolayout::{QueryFunctions, SchemaRegistry, Value};
//!
//! let registry = SchemaRegistry::compile(
//!     "binary Header { Magic: int le, Version: short le, Flags: byte }",
//! )
//! .unwrap();
//! let functions = QueryFunctions::new(Arc::new(registry));
//!
//! let record = functions
//!     .interpret(&[0x78, 0x56, 0x34, 0x12, 0x00, 0x01, 0xFF], "Header")
//!     .unwrap();
//! assert_eq!(record.get("Magic"), Some(&Value::Int(0x12345678)));
//! ```

pub mod config;
pub mod cursor;
pub mod interpreter;
pub mod observability;
pub mod query;
pub mod schema;

pub use config::{ConfigError, DecodeConfig};
pub use cursor::{ByteCursor, DecodeError, DecodeErrorCode, TextCursor};
pub use interpreter::{Interpreter, PartialParseResult, Record, TryParseResult, Value};
pub use query::{QueryError, QueryFunctions, QueryResult};
pub use schema::{SchemaError, SchemaErrorCode, SchemaRegistry, SchemaRegistryBuilder};
