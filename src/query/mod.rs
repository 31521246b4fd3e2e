//! Query-facing decode functions
//!
//! The table-valued functions a query binds to: `Interpret`/`Parse` in
//! strict, try and partial flavours, plus `cross_apply` for flattening an
//! array field into rows.
//!
//! Schema names are resolved per call. An unknown name or a schema of the
//! wrong kind is a binding error and is returned as [`QueryError`] from
//! every flavour. Decode errors propagate from the strict functions only.

mod errors;

pub use errors::{QueryError, QueryResult};

use std::sync::Arc;

use crate::config::DecodeConfig;
use crate::cursor::{ByteCursor, DecodeError, TextCursor};
use crate::interpreter::{Interpreter, PartialParseResult, Record, TryParseResult, Value};
use crate::observability::{log_event, Event, Logger, MetricsRegistry};
use crate::schema::{SchemaDefinition, SchemaKind, SchemaRegistry};

/// Entry points over one shared registry
///
/// `Send + Sync`; share it behind an `Arc` across query workers.
#[derive(Debug, Clone)]
pub struct QueryFunctions {
    registry: Arc<SchemaRegistry>,
    config: DecodeConfig,
    metrics: Arc<MetricsRegistry>,
}

impl QueryFunctions {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, DecodeConfig::default())
    }

    pub fn with_config(registry: Arc<SchemaRegistry>, config: DecodeConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.add_schemas(registry.len() as u64);
        Self {
            registry,
            config,
            metrics,
        }
    }

    /// Compiles `source` with the config's default byte order
    ///
    /// Also applies the config's log level to the process logger.
    pub fn from_source(source: &str, config: DecodeConfig) -> QueryResult<Self> {
        config.validate()?;
        Logger::set_min_severity(config.severity()?);
        let registry = SchemaRegistry::builder()
            .with_default_endianness(config.endianness()?)
            .add_source(source)
            .build()?;
        Ok(Self::with_config(Arc::new(registry), config))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(&self.registry).with_limits(self.config.limits())
    }

    fn schema(&self, name: &str, kind: SchemaKind) -> QueryResult<&SchemaDefinition> {
        let schema = self
            .registry
            .get(name)
            .ok_or_else(|| QueryError::UnknownSchema(name.to_string()))?;
        if schema.kind != kind {
            return Err(QueryError::KindMismatch {
                name: name.to_string(),
                expected: kind.as_str(),
                actual: schema.kind.as_str(),
            });
        }
        Ok(schema)
    }

    /// Decodes `data` with a binary schema
    pub fn interpret(&self, data: &[u8], schema: &str) -> QueryResult<Record> {
        let definition = self.schema(schema, SchemaKind::Binary)?;
        self.metrics.increment_attempted();
        let mut cursor = ByteCursor::new(data);
        let outcome = self.interpreter().interpret(&mut cursor, definition);
        self.metrics.add_bytes(cursor.position() as u64);
        self.record_outcome(schema, outcome).map_err(QueryError::from)
    }

    /// Like [`interpret`](Self::interpret), reporting decode errors as a flag
    pub fn try_interpret(&self, data: &[u8], schema: &str) -> QueryResult<TryParseResult> {
        match self.interpret(data, schema) {
            Ok(record) => Ok(TryParseResult::success(record)),
            Err(QueryError::Decode(_)) => Ok(TryParseResult::failure()),
            Err(other) => Err(other),
        }
    }

    /// Decodes as far as possible, keeping fields resolved before a failure
    pub fn partial_interpret(&self, data: &[u8], schema: &str) -> QueryResult<PartialParseResult> {
        let definition = self.schema(schema, SchemaKind::Binary)?;
        self.metrics.increment_attempted();
        let mut cursor = ByteCursor::new(data);
        let result = self.interpreter().interpret_partial(&mut cursor, definition);
        self.metrics.add_bytes(cursor.position() as u64);
        self.record_partial(schema, &result);
        Ok(result)
    }

    /// Parses `text` with a text schema
    pub fn parse(&self, text: &str, schema: &str) -> QueryResult<Record> {
        let definition = self.schema(schema, SchemaKind::Text)?;
        self.metrics.increment_attempted();
        let mut cursor = TextCursor::new(text);
        let outcome = self.interpreter().parse(&mut cursor, definition);
        self.metrics.add_chars(cursor.position() as u64);
        self.record_outcome(schema, outcome).map_err(QueryError::from)
    }

    pub fn try_parse(&self, text: &str, schema: &str) -> QueryResult<TryParseResult> {
        match self.parse(text, schema) {
            Ok(record) => Ok(TryParseResult::success(record)),
            Err(QueryError::Decode(_)) => Ok(TryParseResult::failure()),
            Err(other) => Err(other),
        }
    }

    pub fn partial_parse(&self, text: &str, schema: &str) -> QueryResult<PartialParseResult> {
        let definition = self.schema(schema, SchemaKind::Text)?;
        self.metrics.increment_attempted();
        let mut cursor = TextCursor::new(text);
        let result = self.interpreter().parse_partial(&mut cursor, definition);
        self.metrics.add_chars(cursor.position() as u64);
        self.record_partial(schema, &result);
        Ok(result)
    }

    /// Expands `path` of a decoded record into rows
    ///
    /// An array yields one row per element, a skipped field (null) yields
    /// none, and any other value yields itself. An empty path yields the
    /// record.
    pub fn cross_apply(record: &Record, path: &str) -> QueryResult<Vec<Value>> {
        if path.is_empty() {
            return Ok(vec![Value::Record(record.clone())]);
        }
        let value = record
            .get_path(path)
            .ok_or_else(|| QueryError::UnknownField(path.to_string()))?;
        Ok(match value {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        })
    }

    fn record_outcome(&self, schema: &str, outcome: Result<Record, DecodeError>) -> Result<Record, DecodeError> {
        match outcome {
            Ok(record) => {
                self.metrics.increment_succeeded();
                Ok(record)
            }
            Err(error) => {
                self.metrics.increment_failed();
                if self.config.log_failures {
                    log_failure(Event::DecodeFailed, schema, &error);
                }
                Err(error)
            }
        }
    }

    fn record_partial(&self, schema: &str, result: &PartialParseResult) {
        if result.is_success {
            self.metrics.increment_succeeded();
            return;
        }
        self.metrics.increment_partial();
        if let (true, Some(error)) = (self.config.log_failures, result.error.as_ref()) {
            log_failure(Event::DecodePartial, schema, error);
        }
    }
}

fn log_failure(event: Event, schema: &str, error: &DecodeError) {
    log_event(
        event,
        &[
            ("schema", schema),
            ("code", error.code().code()),
            ("field", error.field().unwrap_or("")),
            ("position", &error.position().to_string()),
            ("message", error.message()),
        ],
    );
}
