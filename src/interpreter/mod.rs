//! Field evaluation engine
//!
//! Walks a compiled [`SchemaDefinition`] field by field against a cursor,
//! threading every decoded value through a [`FieldEvaluationContext`] so
//! later fields can use it in lengths, counts, conditions and checks.
//!
//! Per field, in declaration order:
//!
//! 1. `when` false: the field is skipped and nothing is consumed
//! 2. `at`: seek relative to the start of the enclosing schema
//! 3. the field kind is read (arrays repeat, nested schemas recurse)
//! 4. `as`: the raw string or blob is decoded again with another schema
//! 5. `check` must hold before the value is stored
//!
//! The first error aborts the decode. Errors from nested decodes carry a
//! dotted field path (`Header.Magic`, `Items[2].Length`).

mod binary;
mod context;
mod eval;
mod result;
mod text;
mod value;

pub use context::FieldEvaluationContext;
pub use result::{PartialParseResult, TryParseResult};
pub use value::{Record, Value};

use crate::cursor::{ByteCursor, DecodeError, DecodeResult, TextCursor};
use crate::schema::{Expr, FieldSpec, SchemaDefinition, SchemaRegistry};

/// Default cap on elements in one array field
pub const DEFAULT_MAX_ARRAY_ELEMENTS: usize = 1_048_576;

/// Default cap on nested schema depth
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Bounds on the work one decode may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_array_elements: usize,
    pub max_nesting_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_array_elements: DEFAULT_MAX_ARRAY_ELEMENTS,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Decodes buffers and strings with schemas from one registry
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'r> {
    registry: &'r SchemaRegistry,
    limits: DecodeLimits,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            limits: DecodeLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Decodes a binary schema, failing on the first error
    pub fn interpret(
        &self,
        cursor: &mut ByteCursor<'_>,
        schema: &SchemaDefinition,
    ) -> DecodeResult<Record> {
        let mut ctx = FieldEvaluationContext::new(schema);
        self.decode_binary(cursor, &mut ctx, 0)?;
        Ok(ctx.into_record())
    }

    /// Decodes a binary schema, keeping whatever resolved before a failure
    pub fn interpret_partial(
        &self,
        cursor: &mut ByteCursor<'_>,
        schema: &SchemaDefinition,
    ) -> PartialParseResult {
        let mut ctx = FieldEvaluationContext::new(schema);
        let outcome = self.decode_binary(cursor, &mut ctx, 0);
        finish_partial(ctx, outcome)
    }

    /// Decodes a text schema, failing on the first error
    pub fn parse(&self, cursor: &mut TextCursor<'_>, schema: &SchemaDefinition) -> DecodeResult<Record> {
        let mut ctx = FieldEvaluationContext::new(schema);
        self.decode_text(cursor, &mut ctx, 0)?;
        Ok(ctx.into_record())
    }

    /// Decodes a text schema, keeping whatever resolved before a failure
    pub fn parse_partial(
        &self,
        cursor: &mut TextCursor<'_>,
        schema: &SchemaDefinition,
    ) -> PartialParseResult {
        let mut ctx = FieldEvaluationContext::new(schema);
        let outcome = self.decode_text(cursor, &mut ctx, 0);
        finish_partial(ctx, outcome)
    }

    /// Guards entry into a nested decode
    fn enter(&self, depth: usize, position: usize) -> DecodeResult<()> {
        if depth >= self.limits.max_nesting_depth {
            return Err(DecodeError::limit_exceeded(
                position,
                format!(
                    "nesting depth exceeds the limit of {}",
                    self.limits.max_nesting_depth
                ),
            ));
        }
        Ok(())
    }

    /// Evaluates an array count and enforces the element limit
    fn element_count(
        &self,
        count: &Expr,
        ctx: &FieldEvaluationContext<'_>,
        position: usize,
    ) -> DecodeResult<usize> {
        let count = eval::evaluate_count(count, ctx, position)?;
        if count > self.limits.max_array_elements {
            return Err(DecodeError::limit_exceeded(
                position,
                format!(
                    "array of {} elements exceeds the limit of {}",
                    count, self.limits.max_array_elements
                ),
            ));
        }
        Ok(count)
    }

    /// Evaluates the field's `check` against its decoded value
    fn check_field(
        &self,
        field: &FieldSpec,
        ctx: &FieldEvaluationContext<'_>,
        value: &Value,
        position: usize,
    ) -> DecodeResult<()> {
        let check = match field.check {
            Some(ref check) => check,
            None => return Ok(()),
        };
        let holds = eval::evaluate_predicate(check, ctx, Some((field.index, value)), position)
            .map_err(|e| e.with_field(&field.name))?;
        if holds {
            Ok(())
        } else {
            Err(DecodeError::validation_failed(
                &field.name,
                position,
                format!("check failed: {}", check),
            ))
        }
    }
}

fn finish_partial(ctx: FieldEvaluationContext<'_>, outcome: DecodeResult<()>) -> PartialParseResult {
    let parsed = ctx.resolved_fields();
    match outcome {
        Ok(()) => PartialParseResult::success(ctx.into_record(), parsed),
        Err(error) => PartialParseResult::failure(ctx.into_record(), parsed, error),
    }
}
