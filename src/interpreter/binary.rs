//! Binary schema interpretation over a [`ByteCursor`]

use crate::cursor::{ByteCursor, DecodeError, DecodeResult, TextCursor};
use crate::schema::{
    BinaryFieldKind, Endianness, FieldKind, FieldSpec, PrimitiveType, SchemaDefinition, SchemaRef,
};

use super::context::FieldEvaluationContext;
use super::eval;
use super::value::Value;
use super::Interpreter;

impl<'r> Interpreter<'r> {
    /// Decodes every field of a binary schema into `ctx`
    ///
    /// Stops at the first error; `ctx` keeps whatever was resolved before it.
    pub(crate) fn decode_binary(
        &self,
        cursor: &mut ByteCursor<'_>,
        ctx: &mut FieldEvaluationContext<'_>,
        depth: usize,
    ) -> DecodeResult<()> {
        let schema = ctx.schema();
        ensure_kind(schema, true, cursor.position())?;
        let base = cursor.position();

        for field in &schema.fields {
            let start = cursor.position();
            if let Some(ref when) = field.when {
                let present = eval::evaluate_predicate(when, ctx, None, start)
                    .map_err(|e| e.with_field(&field.name))?;
                if !present {
                    continue;
                }
            }

            if let Some(ref at) = field.at {
                let offset = eval::evaluate_count(at, ctx, start)
                    .map_err(|e| e.with_field(&field.name))?;
                let target = base.checked_add(offset).ok_or_else(|| {
                    DecodeError::invalid_value(start, format!("offset {} overflows", offset))
                        .with_field(&field.name)
                })?;
                cursor.seek_to(target);
            }

            let value = self
                .read_binary_field(cursor, field, ctx, depth)
                .map_err(|e| e.with_field(&field.name))?;
            self.check_field(field, ctx, &value, start)?;
            ctx.insert(field.index, value);
        }
        Ok(())
    }

    fn read_binary_field(
        &self,
        cursor: &mut ByteCursor<'_>,
        field: &FieldSpec,
        ctx: &FieldEvaluationContext<'_>,
        depth: usize,
    ) -> DecodeResult<Value> {
        let kind = match &field.kind {
            FieldKind::Binary(kind) => kind,
            FieldKind::Text(_) => {
                return Err(DecodeError::invalid_value(
                    cursor.position(),
                    "text field in a binary schema",
                ))
            }
        };

        match kind {
            BinaryFieldKind::Primitive { ty, endianness } => {
                read_primitive(cursor, *ty, *endianness)
            }
            BinaryFieldKind::PrimitiveArray {
                ty,
                endianness,
                count,
            } => {
                let count = self.element_count(count, ctx, cursor.position())?;
                cursor.ensure_bytes(count.saturating_mul(ty.width()))?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(read_primitive(cursor, *ty, *endianness)?);
                }
                Ok(Value::Array(items))
            }
            BinaryFieldKind::Bytes { length } => {
                let length = eval::evaluate_count(length, ctx, cursor.position())?;
                let bytes = cursor.read_slice(length)?;
                match field.embedded {
                    Some(ref target) => self
                        .embedded_binary(bytes, target, depth)
                        .map_err(|e| e.within(&field.name)),
                    None => Ok(Value::Bytes(bytes.to_vec())),
                }
            }
            BinaryFieldKind::String {
                length,
                encoding,
                null_terminated,
            } => {
                let length = eval::evaluate_count(length, ctx, cursor.position())?;
                let raw = if *null_terminated {
                    cursor.read_null_terminated_string(length, *encoding)?
                } else {
                    cursor.read_string(length, *encoding)?
                };
                let text = field.modifiers.apply(&raw);
                match field.embedded {
                    Some(ref target) => self
                        .embedded_text(&text, target, depth)
                        .map_err(|e| e.within(&field.name)),
                    None => Ok(Value::Text(text)),
                }
            }
            BinaryFieldKind::Bits { width } => Ok(Value::ULong(cursor.read_bits(*width)?)),
            BinaryFieldKind::Align { bits } => {
                cursor.align_to_bits(*bits)?;
                Ok(Value::Null)
            }
            BinaryFieldKind::Nested { schema } => self
                .nested_binary(cursor, schema, depth)
                .map_err(|e| e.within(&field.name)),
            BinaryFieldKind::NestedArray { schema, count } => {
                let count = self.element_count(count, ctx, cursor.position())?;
                let mut items = Vec::with_capacity(count);
                for i in 0..count {
                    let item = self
                        .nested_binary(cursor, schema, depth)
                        .map_err(|e| e.within(&format!("{}[{}]", field.name, i)))?;
                    items.push(item);
                }
                Ok(Value::Array(items))
            }
        }
    }

    /// Runs a referenced binary schema over the same cursor
    fn nested_binary(
        &self,
        cursor: &mut ByteCursor<'_>,
        target: &SchemaRef,
        depth: usize,
    ) -> DecodeResult<Value> {
        self.enter(depth, cursor.position())?;
        let schema = self.registry.resolve(target);
        let mut ctx = FieldEvaluationContext::new(schema);
        self.decode_binary(cursor, &mut ctx, depth + 1)?;
        Ok(Value::Record(ctx.into_record()))
    }

    /// Runs a referenced binary schema over exactly `bytes`
    fn embedded_binary(&self, bytes: &[u8], target: &SchemaRef, depth: usize) -> DecodeResult<Value> {
        let mut sub = ByteCursor::new(bytes);
        self.nested_binary(&mut sub, target, depth)
    }

    /// Runs a referenced text schema over a decoded string
    pub(crate) fn embedded_text(
        &self,
        text: &str,
        target: &SchemaRef,
        depth: usize,
    ) -> DecodeResult<Value> {
        let mut sub = TextCursor::new(text);
        self.nested_text(&mut sub, target, depth)
    }
}

pub(crate) fn ensure_kind(schema: &SchemaDefinition, binary: bool, position: usize) -> DecodeResult<()> {
    if schema.is_binary() == binary {
        return Ok(());
    }
    Err(DecodeError::invalid_value(
        position,
        format!(
            "schema '{}' is a {} schema",
            schema.name,
            schema.kind.as_str()
        ),
    ))
}

fn read_primitive(
    cursor: &mut ByteCursor<'_>,
    ty: PrimitiveType,
    endianness: Endianness,
) -> DecodeResult<Value> {
    let big = endianness == Endianness::Big;
    let value = match ty {
        PrimitiveType::Byte => Value::Byte(cursor.read_byte()?),
        PrimitiveType::SByte => Value::SByte(cursor.read_sbyte()?),
        PrimitiveType::Short if big => Value::Short(cursor.read_i16_be()?),
        PrimitiveType::Short => Value::Short(cursor.read_i16_le()?),
        PrimitiveType::UShort if big => Value::UShort(cursor.read_u16_be()?),
        PrimitiveType::UShort => Value::UShort(cursor.read_u16_le()?),
        PrimitiveType::Int if big => Value::Int(cursor.read_i32_be()?),
        PrimitiveType::Int => Value::Int(cursor.read_i32_le()?),
        PrimitiveType::UInt if big => Value::UInt(cursor.read_u32_be()?),
        PrimitiveType::UInt => Value::UInt(cursor.read_u32_le()?),
        PrimitiveType::Long if big => Value::Long(cursor.read_i64_be()?),
        PrimitiveType::Long => Value::Long(cursor.read_i64_le()?),
        PrimitiveType::ULong if big => Value::ULong(cursor.read_u64_be()?),
        PrimitiveType::ULong => Value::ULong(cursor.read_u64_le()?),
        PrimitiveType::Float if big => Value::Float(cursor.read_f32_be()?),
        PrimitiveType::Float => Value::Float(cursor.read_f32_le()?),
        PrimitiveType::Double if big => Value::Double(cursor.read_f64_be()?),
        PrimitiveType::Double => Value::Double(cursor.read_f64_le()?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::DecodeErrorCode;
    use crate::interpreter::DecodeLimits;
    use crate::schema::SchemaRegistry;

    fn decode(source: &str, schema: &str, data: &[u8]) -> DecodeResult<crate::interpreter::Record> {
        let registry = SchemaRegistry::compile(source).unwrap();
        let interpreter = Interpreter::new(&registry);
        let mut cursor = ByteCursor::new(data);
        interpreter.interpret(&mut cursor, registry.get(schema).unwrap())
    }

    #[test]
    fn test_mixed_endianness() {
        let record = decode(
            "binary H { A: ushort le, B: ushort be, C: sbyte }",
            "H",
            &[0x01, 0x02, 0x01, 0x02, 0xFF],
        )
        .unwrap();
        assert_eq!(record.get("A"), Some(&Value::UShort(0x0201)));
        assert_eq!(record.get("B"), Some(&Value::UShort(0x0102)));
        assert_eq!(record.get("C"), Some(&Value::SByte(-1)));
    }

    #[test]
    fn test_bits_then_align() {
        let record = decode(
            "binary F { Hi: bits[3], Lo: bits[5], Top: bits[4], _: align[8], Next: byte }",
            "F",
            &[0b101_00110, 0b1111_0000, 0x2A],
        )
        .unwrap();
        assert_eq!(record.get("Hi"), Some(&Value::ULong(0b101)));
        assert_eq!(record.get("Lo"), Some(&Value::ULong(0b00110)));
        assert_eq!(record.get("Top"), Some(&Value::ULong(0b1111)));
        assert_eq!(record.get("Next"), Some(&Value::Byte(0x2A)));
        assert_eq!(record.field_names(), vec!["Hi", "Lo", "Top", "Next"]);
    }

    #[test]
    fn test_strings_and_blobs() {
        let record = decode(
            "binary S { Len: byte, Name: string[Len] trim, Tag: string[8] nullterm, Blob: byte[2] }",
            "S",
            b"\x04 ab ok\0zzzz\x01\x02",
        )
        .unwrap();
        assert_eq!(record.get("Name"), Some(&Value::Text("ab".into())));
        assert_eq!(record.get("Tag"), Some(&Value::Text("ok".into())));
        assert_eq!(record.get("Blob"), Some(&Value::Bytes(b"zz".to_vec())));
    }

    #[test]
    fn test_at_is_relative_to_schema_start() {
        let record = decode(
            "binary Inner { Off: byte, Val: byte at Off };
             binary Outer { Pad: byte, In: Inner }",
            "Outer",
            &[0xEE, 0x02, 0x00, 0x77],
        )
        .unwrap();
        let inner = record.get("In").unwrap().as_record().unwrap();
        assert_eq!(inner.get("Val"), Some(&Value::Byte(0x77)));
    }

    #[test]
    fn test_embedded_blob_is_bounded() {
        let err = decode(
            "binary Two { A: byte, B: byte };
             binary Outer { Body: byte[1] as Two, After: byte }",
            "Outer",
            &[0x01, 0x02, 0x03],
        )
        .unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeStructural);
        assert_eq!(err.field(), Some("Body.B"));
    }

    #[test]
    fn test_embedded_text_schema() {
        let record = decode(
            "text Pair { Key: until '=', Value: rest };
             binary Outer { Len: byte, Kv: string[Len] as Pair }",
            "Outer",
            b"\x05a=bcd",
        )
        .unwrap();
        let pair = record.get("Kv").unwrap().as_record().unwrap();
        assert_eq!(pair.get("Key"), Some(&Value::Text("a".into())));
        assert_eq!(pair.get("Value"), Some(&Value::Text("bcd".into())));
    }

    #[test]
    fn test_nested_array_error_path() {
        let err = decode(
            "binary Item { V: ushort };
             binary List { Count: byte, Items: Item[Count] }",
            "List",
            &[0x02, 0x01, 0x00, 0x05],
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("Items[1].V"));
    }

    #[test]
    fn test_check_failure() {
        let err = decode("binary C { V: byte check V < 10 }", "C", &[42]).unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeValidationFailed);
        assert_eq!(err.field(), Some("V"));
    }

    #[test]
    fn test_array_limit() {
        let registry = SchemaRegistry::compile("binary A { N: byte, W: ushort[N] }").unwrap();
        let interpreter = Interpreter::new(&registry).with_limits(DecodeLimits {
            max_array_elements: 2,
            max_nesting_depth: 8,
        });
        let mut cursor = ByteCursor::new(&[3, 0, 0, 0, 0, 0, 0]);
        let err = interpreter
            .interpret(&mut cursor, registry.get("A").unwrap())
            .unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeLimitExceeded);
        assert_eq!(err.field(), Some("W"));
    }

    #[test]
    fn test_recursive_schema_hits_depth_limit() {
        let registry = SchemaRegistry::compile("binary R { Tag: byte, Next: R when Tag <> 0 }").unwrap();
        let interpreter = Interpreter::new(&registry).with_limits(DecodeLimits {
            max_array_elements: 16,
            max_nesting_depth: 3,
        });

        let mut cursor = ByteCursor::new(&[1, 1, 0]);
        let record = interpreter
            .interpret(&mut cursor, registry.get("R").unwrap())
            .unwrap();
        assert_eq!(record.get_path("Next.Next.Tag"), Some(&Value::Byte(0)));

        let mut cursor = ByteCursor::new(&[1, 1, 1, 1, 1]);
        let err = interpreter
            .interpret(&mut cursor, registry.get("R").unwrap())
            .unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeLimitExceeded);
        assert_eq!(err.field(), Some("Next.Next.Next.Next"));
    }
}
