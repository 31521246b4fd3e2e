//! Text schema interpretation over a [`TextCursor`]

use crate::cursor::{BetweenOptions, DecodeError, DecodeResult, TextCursor, UntilOptions};
use crate::schema::{FieldKind, FieldSpec, SchemaRef, TextFieldKind};

use super::binary::ensure_kind;
use super::context::FieldEvaluationContext;
use super::eval;
use super::value::Value;
use super::Interpreter;

impl<'r> Interpreter<'r> {
    /// Decodes every field of a text schema into `ctx`
    pub(crate) fn decode_text(
        &self,
        cursor: &mut TextCursor<'_>,
        ctx: &mut FieldEvaluationContext<'_>,
        depth: usize,
    ) -> DecodeResult<()> {
        let schema = ctx.schema();
        ensure_kind(schema, false, cursor.position())?;

        for field in &schema.fields {
            let start = cursor.position();
            if let Some(ref when) = field.when {
                let present = eval::evaluate_predicate(when, ctx, None, start)
                    .map_err(|e| e.with_field(&field.name))?;
                if !present {
                    continue;
                }
            }

            let value = self
                .read_text_field(cursor, field, ctx, depth)
                .map_err(|e| e.with_field(&field.name))?;
            self.check_field(field, ctx, &value, start)?;
            ctx.insert(field.index, value);
        }
        Ok(())
    }

    fn read_text_field(
        &self,
        cursor: &mut TextCursor<'_>,
        field: &FieldSpec,
        ctx: &FieldEvaluationContext<'_>,
        depth: usize,
    ) -> DecodeResult<Value> {
        let kind = match &field.kind {
            FieldKind::Text(kind) => kind,
            FieldKind::Binary(_) => {
                return Err(DecodeError::invalid_value(
                    cursor.position(),
                    "binary field in a text schema",
                ))
            }
        };
        let modifiers = field.modifiers;

        let text = match kind {
            TextFieldKind::Until { delimiter } => cursor.read_until(
                delimiter,
                UntilOptions {
                    modifiers,
                    ..UntilOptions::default()
                },
            )?,
            TextFieldKind::Between {
                open,
                close,
                nested,
                escaped,
            } => cursor.read_between(
                open,
                close,
                BetweenOptions {
                    modifiers,
                    nested: *nested,
                    escaped: *escaped,
                },
            )?,
            TextFieldKind::Pattern { regex, .. } => cursor.read_pattern(regex, modifiers)?,
            TextFieldKind::Literal { text } => cursor.expect_literal(text)?,
            TextFieldKind::Chars { count } => {
                let count = eval::evaluate_count(count, ctx, cursor.position())?;
                cursor.read_chars(count, modifiers)?
            }
            TextFieldKind::Token => cursor.read_token(modifiers)?,
            TextFieldKind::Whitespace { optional: true } => cursor.skip_optional_whitespace(),
            TextFieldKind::Whitespace { optional: false } => cursor.skip_whitespace(true)?,
            TextFieldKind::Rest => cursor.read_rest(modifiers)?,
            TextFieldKind::Nested { schema } => {
                return self
                    .nested_text(cursor, schema, depth)
                    .map_err(|e| e.within(&field.name))
            }
            TextFieldKind::NestedArray { schema, count } => {
                let count = self.element_count(count, ctx, cursor.position())?;
                let mut items = Vec::with_capacity(count);
                for i in 0..count {
                    let item = self
                        .nested_text(cursor, schema, depth)
                        .map_err(|e| e.within(&format!("{}[{}]", field.name, i)))?;
                    items.push(item);
                }
                return Ok(Value::Array(items));
            }
        };

        match field.embedded {
            Some(ref target) => self
                .embedded_text(&text, target, depth)
                .map_err(|e| e.within(&field.name)),
            None => Ok(Value::Text(text)),
        }
    }

    /// Runs a referenced text schema over the same cursor
    pub(crate) fn nested_text(
        &self,
        cursor: &mut TextCursor<'_>,
        target: &SchemaRef,
        depth: usize,
    ) -> DecodeResult<Value> {
        self.enter(depth, cursor.position())?;
        let schema = self.registry.resolve(target);
        let mut ctx = FieldEvaluationContext::new(schema);
        self.decode_text(cursor, &mut ctx, depth + 1)?;
        Ok(Value::Record(ctx.into_record()))
    }
}
