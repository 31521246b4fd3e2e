//! Compiled schema model
//!
//! A schema is an ordered list of field specifications. Field kinds form a
//! closed enum matched explicitly by the interpreter; nested and embedded
//! schema references carry the registry index they were resolved to at
//! build time.

use regex::Regex;

use crate::cursor::{Encoding, TextModifiers};
use crate::interpreter::Value;

use super::expr::Expr;

/// Schema flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Binary,
    Text,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Binary => "binary",
            SchemaKind::Text => "text",
        }
    }
}

/// Index of a schema inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Resolved reference to another schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    pub name: String,
    pub id: SchemaId,
    pub kind: SchemaKind,
}

/// Byte order of multi-byte primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "le" => Some(Endianness::Little),
            "be" => Some(Endianness::Big),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endianness::Little => "le",
            Endianness::Big => "be",
        }
    }
}

/// Fixed-width numeric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Byte,
    SByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "byte" => Some(PrimitiveType::Byte),
            "sbyte" => Some(PrimitiveType::SByte),
            "short" => Some(PrimitiveType::Short),
            "ushort" => Some(PrimitiveType::UShort),
            "int" => Some(PrimitiveType::Int),
            "uint" => Some(PrimitiveType::UInt),
            "long" => Some(PrimitiveType::Long),
            "ulong" => Some(PrimitiveType::ULong),
            "float" => Some(PrimitiveType::Float),
            "double" => Some(PrimitiveType::Double),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Byte => "byte",
            PrimitiveType::SByte => "sbyte",
            PrimitiveType::Short => "short",
            PrimitiveType::UShort => "ushort",
            PrimitiveType::Int => "int",
            PrimitiveType::UInt => "uint",
            PrimitiveType::Long => "long",
            PrimitiveType::ULong => "ulong",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Width in bytes
    pub fn width(&self) -> usize {
        match self {
            PrimitiveType::Byte | PrimitiveType::SByte => 1,
            PrimitiveType::Short | PrimitiveType::UShort => 2,
            PrimitiveType::Int | PrimitiveType::UInt | PrimitiveType::Float => 4,
            PrimitiveType::Long | PrimitiveType::ULong | PrimitiveType::Double => 8,
        }
    }

    /// Zero of this type
    pub fn default_value(&self) -> Value {
        match self {
            PrimitiveType::Byte => Value::Byte(0),
            PrimitiveType::SByte => Value::SByte(0),
            PrimitiveType::Short => Value::Short(0),
            PrimitiveType::UShort => Value::UShort(0),
            PrimitiveType::Int => Value::Int(0),
            PrimitiveType::UInt => Value::UInt(0),
            PrimitiveType::Long => Value::Long(0),
            PrimitiveType::ULong => Value::ULong(0),
            PrimitiveType::Float => Value::Float(0.0),
            PrimitiveType::Double => Value::Double(0.0),
        }
    }
}

/// Field kinds of `binary` schemas
#[derive(Debug, Clone)]
pub enum BinaryFieldKind {
    /// `int le`
    Primitive {
        ty: PrimitiveType,
        endianness: Endianness,
    },
    /// `int[Count] le`
    PrimitiveArray {
        ty: PrimitiveType,
        endianness: Endianness,
        count: Expr,
    },
    /// `byte[Len]`
    Bytes { length: Expr },
    /// `string[Len] utf8 nullterm`
    String {
        length: Expr,
        encoding: Encoding,
        null_terminated: bool,
    },
    /// `bits[3]`
    Bits { width: u32 },
    /// `align[32]`
    Align { bits: u32 },
    /// `Header`
    Nested { schema: SchemaRef },
    /// `Entry[Count]`
    NestedArray { schema: SchemaRef, count: Expr },
}

/// Field kinds of `text` schemas
#[derive(Debug, Clone)]
pub enum TextFieldKind {
    Until {
        delimiter: String,
    },
    Between {
        open: String,
        close: String,
        nested: bool,
        escaped: bool,
    },
    /// Anchored pattern plus the source text it was written as
    Pattern {
        source: String,
        regex: Regex,
    },
    Literal {
        text: String,
    },
    Chars {
        count: Expr,
    },
    Token,
    Whitespace {
        optional: bool,
    },
    Rest,
    Nested {
        schema: SchemaRef,
    },
    NestedArray {
        schema: SchemaRef,
        count: Expr,
    },
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Binary(BinaryFieldKind),
    Text(TextFieldKind),
}

/// Name used for fields whose value is discarded
pub const PLACEHOLDER: &str = "_";

/// Compiled description of one field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name (`_` for placeholders)
    pub name: String,
    /// Declaration index within the schema
    pub index: usize,
    pub kind: FieldKind,
    /// Trimming/casing applied to text values
    pub modifiers: TextModifiers,
    /// Schema the raw value is re-decoded with (`as Name`)
    pub embedded: Option<SchemaRef>,
    /// Field is only decoded when this holds
    pub when: Option<Expr>,
    /// Absolute offset relative to the schema start (binary only)
    pub at: Option<Expr>,
    /// Post-decode validation predicate
    pub check: Option<Expr>,
}

impl FieldSpec {
    pub fn is_placeholder(&self) -> bool {
        self.name == PLACEHOLDER
    }

    pub fn is_conditional(&self) -> bool {
        self.when.is_some()
    }

    /// Value the field holds when it is not decoded
    pub fn default_value(&self) -> Value {
        if self.embedded.is_some() {
            return Value::Null;
        }
        match &self.kind {
            FieldKind::Binary(BinaryFieldKind::Primitive { ty, .. }) => ty.default_value(),
            FieldKind::Binary(BinaryFieldKind::Bits { .. }) => Value::ULong(0),
            _ => Value::Null,
        }
    }

    /// Schemas this field decodes into, if any
    pub fn referenced_schema(&self) -> Option<&SchemaRef> {
        match &self.kind {
            FieldKind::Binary(BinaryFieldKind::Nested { schema })
            | FieldKind::Binary(BinaryFieldKind::NestedArray { schema, .. })
            | FieldKind::Text(TextFieldKind::Nested { schema })
            | FieldKind::Text(TextFieldKind::NestedArray { schema, .. }) => Some(schema),
            _ => self.embedded.as_ref(),
        }
    }
}

/// A compiled, immutable schema
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub name: String,
    pub kind: SchemaKind,
    pub id: SchemaId,
    pub fields: Vec<FieldSpec>,
}

impl SchemaDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the fields that appear in decoded records
    pub fn output_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_placeholder())
    }

    pub fn is_binary(&self) -> bool {
        self.kind == SchemaKind::Binary
    }
}
