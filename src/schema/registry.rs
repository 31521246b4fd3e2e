//! Immutable, name-keyed store of compiled schemas
//!
//! Built once from DSL sources, then shared read-only (typically behind an
//! `Arc`) by every decode. Nested and embedded references inside the
//! stored definitions are registry ids, so decoding never looks names up.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::observability::{log_event, Event, ObservationScope};

use super::errors::{SchemaError, SchemaResult};
use super::lexer::{tokenize, Token};
use super::loader::{SchemaLoader, SchemaSource};
use super::parser::{scan_headers, Parser};
use super::types::{
    BinaryFieldKind, Endianness, FieldKind, SchemaDefinition, SchemaId, SchemaKind, SchemaRef,
};

/// Words that cannot be used as schema names
const RESERVED_NAMES: [&str; 24] = [
    "binary", "text", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float",
    "double", "string", "bits", "align", "until", "between", "pattern", "literal", "chars",
    "token", "whitespace", "rest", "as",
];

#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: Vec<SchemaDefinition>,
    by_name: HashMap<String, SchemaId>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Compiles a single DSL source with default settings
    pub fn compile(source: &str) -> SchemaResult<Self> {
        Self::builder().add_source(source).build()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDefinition> {
        self.by_name.get(name).map(|id| &self.schemas[id.0])
    }

    /// Looks up a definition by id
    ///
    /// Ids only come from this registry, so the lookup always succeeds.
    pub fn definition(&self, id: SchemaId) -> &SchemaDefinition {
        &self.schemas[id.0]
    }

    pub fn resolve(&self, reference: &SchemaRef) -> &SchemaDefinition {
        self.definition(reference.id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Schema names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDefinition> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Byte width of a binary schema made only of fixed-size fields
    ///
    /// `None` for text schemas and for schemas with conditional,
    /// offset, bit-level, null-terminated or reference-counted fields.
    pub fn fixed_width(&self, name: &str) -> Option<usize> {
        let schema = self.get(name)?;
        let mut visiting = HashSet::new();
        self.width_of(schema, &mut visiting)
    }

    fn width_of(&self, schema: &SchemaDefinition, visiting: &mut HashSet<SchemaId>) -> Option<usize> {
        if schema.kind != SchemaKind::Binary || !visiting.insert(schema.id) {
            return None;
        }
        let mut total = 0usize;
        for field in &schema.fields {
            if field.when.is_some() || field.at.is_some() {
                return None;
            }
            let FieldKind::Binary(kind) = &field.kind else {
                return None;
            };
            let width = match kind {
                BinaryFieldKind::Primitive { ty, .. } => ty.width(),
                BinaryFieldKind::PrimitiveArray { ty, count, .. } => {
                    ty.width().checked_mul(constant_usize(count.as_constant())?)?
                }
                BinaryFieldKind::Bytes { length } => constant_usize(length.as_constant())?,
                BinaryFieldKind::String {
                    length,
                    null_terminated: false,
                    ..
                } => constant_usize(length.as_constant())?,
                BinaryFieldKind::String { .. }
                | BinaryFieldKind::Bits { .. }
                | BinaryFieldKind::Align { .. } => return None,
                BinaryFieldKind::Nested { schema } => {
                    self.width_of(self.resolve(schema), visiting)?
                }
                BinaryFieldKind::NestedArray { schema, count } => {
                    let inner = self.width_of(self.resolve(schema), visiting)?;
                    inner.checked_mul(constant_usize(count.as_constant())?)?
                }
            };
            total = total.checked_add(width)?;
        }
        visiting.remove(&schema.id);
        Some(total)
    }
}

fn constant_usize(value: Option<i128>) -> Option<usize> {
    value.and_then(|v| usize::try_from(v).ok())
}

/// Collects DSL sources and compiles them into a [`SchemaRegistry`]
///
/// Schemas may reference each other across sources; all headers are
/// registered before any body is compiled.
#[derive(Debug)]
pub struct SchemaRegistryBuilder {
    sources: Vec<SchemaSource>,
    default_endianness: Endianness,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            default_endianness: Endianness::Little,
        }
    }

    pub fn add_source(self, text: impl Into<String>) -> Self {
        let origin = format!("<source {}>", self.sources.len());
        self.add_named_source(origin, text)
    }

    pub fn add_named_source(mut self, origin: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.push(SchemaSource::new(origin, text));
        self
    }

    pub fn add_file(mut self, path: &Path) -> SchemaResult<Self> {
        self.sources.push(SchemaSource::from_file(path)?);
        Ok(self)
    }

    /// Adds every `.schema` file in `dir`
    pub fn load_dir(mut self, dir: &Path) -> SchemaResult<Self> {
        let sources = SchemaLoader::new(dir).load_all()?;
        log_event(
            Event::SchemasLoaded,
            &[
                ("dir", &dir.display().to_string()),
                ("files", &sources.len().to_string()),
            ],
        );
        self.sources.extend(sources);
        Ok(self)
    }

    /// Byte order for primitives declared without `le`/`be`
    pub fn with_default_endianness(mut self, endianness: Endianness) -> Self {
        self.default_endianness = endianness;
        self
    }

    pub fn build(self) -> SchemaResult<SchemaRegistry> {
        let scope = ObservationScope::new("SCHEMA_REGISTRY_BUILD");
        match self.compile() {
            Ok(registry) => {
                scope.complete(&[("schemas", &registry.len().to_string())]);
                Ok(registry)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    fn compile(self) -> SchemaResult<SchemaRegistry> {
        let mut tokenized: Vec<(&SchemaSource, Vec<Token>)> = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let tokens = tokenize(&source.text).map_err(|e| e.in_origin(&source.origin))?;
            tokenized.push((source, tokens));
        }

        let mut symbols: HashMap<String, SchemaRef> = HashMap::new();
        let mut by_name = HashMap::new();
        for (source, tokens) in &tokenized {
            for header in scan_headers(tokens) {
                let locate = |e: SchemaError| e.at(header.line, header.column).in_origin(&source.origin);
                if RESERVED_NAMES.contains(&header.name.as_str()) {
                    return Err(locate(SchemaError::invalid_field(format!(
                        "'{}' is reserved and cannot name a schema",
                        header.name
                    ))));
                }
                if symbols.contains_key(&header.name) {
                    return Err(locate(SchemaError::duplicate_schema(&header.name)));
                }
                let id = SchemaId(symbols.len());
                by_name.insert(header.name.clone(), id);
                symbols.insert(
                    header.name.clone(),
                    SchemaRef {
                        name: header.name,
                        id,
                        kind: header.kind,
                    },
                );
            }
        }

        let mut slots: Vec<Option<SchemaDefinition>> = vec![None; symbols.len()];
        for (source, tokens) in &tokenized {
            let parsed = Parser::new(tokens, &symbols, self.default_endianness)
                .parse_all()
                .map_err(|e| e.in_origin(&source.origin))?;
            for schema in parsed {
                log_event(
                    Event::SchemaCompiled,
                    &[
                        ("schema", &schema.name),
                        ("kind", schema.kind.as_str()),
                        ("fields", &schema.fields.len().to_string()),
                    ],
                );
                let slot = schema.id.0;
                slots[slot] = Some(schema);
            }
        }

        let schemas = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| SchemaError::invalid_field("schema header without a body"))?;

        Ok(SchemaRegistry { schemas, by_name })
    }
}

impl Default for SchemaRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
