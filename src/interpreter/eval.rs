//! Expression evaluation against a field context
//!
//! Values are widened to a small scalar domain: integers as `i128`, floats
//! as `f64`, text, booleans and null. Integer arithmetic is checked;
//! overflow and division by zero are validation errors.

use std::cmp::Ordering;

use crate::cursor::{DecodeError, DecodeResult};
use crate::schema::{BinaryOp, Expr, FieldRef, UnaryOp};

use super::context::FieldEvaluationContext;
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i128),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Scalar {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Float(v) => Scalar::Float(*v as f64),
            Value::Double(v) => Scalar::Float(*v),
            Value::Text(s) => Scalar::Text(s.clone()),
            other => other.as_i128().map_or(Scalar::Null, Scalar::Int),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Int(v) => *v != 0,
            Scalar::Float(v) => *v != 0.0,
            Scalar::Text(s) => !s.is_empty(),
            Scalar::Bool(b) => *b,
            Scalar::Null => false,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Text(_) => "string",
            Scalar::Bool(_) => "bool",
            Scalar::Null => "null",
        }
    }

    /// Numeric view; text is parsed, booleans count as 0/1
    fn numeric(&self) -> Option<Scalar> {
        match self {
            Scalar::Int(_) | Scalar::Float(_) => Some(self.clone()),
            Scalar::Bool(b) => Some(Scalar::Int(*b as i128)),
            Scalar::Text(s) => {
                let s = s.trim();
                s.parse::<i128>()
                    .map(Scalar::Int)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(Scalar::Float))
            }
            Scalar::Null => None,
        }
    }

    fn integer(&self) -> Option<i128> {
        match self.numeric()? {
            Scalar::Int(v) => Some(v),
            Scalar::Float(v) if v.fract() == 0.0 && v.abs() < 1e30 => Some(v as i128),
            _ => None,
        }
    }
}

/// A field value that is decoded but not yet stored in the context
pub type Pending<'v> = Option<(usize, &'v Value)>;

/// Evaluates `expr`; `position` is reported in errors
pub fn evaluate(
    expr: &Expr,
    ctx: &FieldEvaluationContext<'_>,
    pending: Pending<'_>,
    position: usize,
) -> DecodeResult<Scalar> {
    match expr {
        Expr::Integer(v) => Ok(Scalar::Int(*v)),
        Expr::Float(v) => Ok(Scalar::Float(*v)),
        Expr::Str(s) => Ok(Scalar::Text(s.clone())),
        Expr::Bool(b) => Ok(Scalar::Bool(*b)),
        Expr::Field(reference) => Ok(field_value(reference, ctx, pending)),
        Expr::Unary(UnaryOp::Not, inner) => {
            let value = evaluate(inner, ctx, pending, position)?;
            Ok(Scalar::Bool(!value.is_truthy()))
        }
        Expr::Unary(UnaryOp::Neg, inner) => {
            match evaluate(inner, ctx, pending, position)?.numeric() {
                Some(Scalar::Int(v)) => v
                    .checked_neg()
                    .map(Scalar::Int)
                    .ok_or_else(|| overflow(position, expr)),
                Some(Scalar::Float(v)) => Ok(Scalar::Float(-v)),
                _ => Err(DecodeError::invalid_value(
                    position,
                    format!("cannot negate non-numeric value in '{}'", expr),
                )),
            }
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            if !evaluate(lhs, ctx, pending, position)?.is_truthy() {
                return Ok(Scalar::Bool(false));
            }
            Ok(Scalar::Bool(evaluate(rhs, ctx, pending, position)?.is_truthy()))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            if evaluate(lhs, ctx, pending, position)?.is_truthy() {
                return Ok(Scalar::Bool(true));
            }
            Ok(Scalar::Bool(evaluate(rhs, ctx, pending, position)?.is_truthy()))
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = evaluate(lhs, ctx, pending, position)?;
            let right = evaluate(rhs, ctx, pending, position)?;
            if op.is_comparison() {
                Ok(Scalar::Bool(compare(*op, &left, &right)))
            } else {
                arithmetic(*op, &left, &right, expr, position)
            }
        }
    }
}

/// Evaluates a predicate (`when`, `check`) to a boolean
pub fn evaluate_predicate(
    expr: &Expr,
    ctx: &FieldEvaluationContext<'_>,
    pending: Pending<'_>,
    position: usize,
) -> DecodeResult<bool> {
    Ok(evaluate(expr, ctx, pending, position)?.is_truthy())
}

/// Evaluates a length, count or offset
///
/// Negative results are structural errors; anything that is not a whole
/// number is a validation error.
pub fn evaluate_count(
    expr: &Expr,
    ctx: &FieldEvaluationContext<'_>,
    position: usize,
) -> DecodeResult<usize> {
    let value = evaluate(expr, ctx, None, position)?;
    let integer = value.integer().ok_or_else(|| {
        DecodeError::invalid_value(
            position,
            format!("'{}' evaluated to {} which is not a whole number", expr, value.type_name()),
        )
    })?;
    if integer < 0 {
        return Err(DecodeError::negative_length(position, integer));
    }
    usize::try_from(integer).map_err(|_| {
        DecodeError::invalid_value(position, format!("'{}' = {} is too large", expr, integer))
    })
}

fn field_value(reference: &FieldRef, ctx: &FieldEvaluationContext<'_>, pending: Pending<'_>) -> Scalar {
    let root = match pending {
        Some((index, value)) if index == reference.index => value.clone(),
        _ => ctx.value_or_default(reference.index),
    };
    let mut current = &root;
    for segment in reference.path.iter().skip(1) {
        match current.as_record().and_then(|r| r.get(segment)) {
            Some(next) => current = next,
            None => return Scalar::Null,
        }
    }
    Scalar::from_value(current)
}

fn overflow(position: usize, expr: &Expr) -> DecodeError {
    DecodeError::invalid_value(position, format!("integer overflow in '{}'", expr))
}

fn compare(op: BinaryOp, left: &Scalar, right: &Scalar) -> bool {
    let ordering = match (left, right) {
        (Scalar::Null, Scalar::Null) => Some(Ordering::Equal),
        (Scalar::Null, _) | (_, Scalar::Null) => None,
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        _ => match (left.numeric(), right.numeric()) {
            (Some(Scalar::Int(a)), Some(Scalar::Int(b))) => Some(a.cmp(&b)),
            (Some(a), Some(b)) => as_f64(&a).partial_cmp(&as_f64(&b)),
            _ => None,
        },
    };
    match (op, ordering) {
        (BinaryOp::Eq, Some(o)) => o == Ordering::Equal,
        (BinaryOp::Ne, Some(o)) => o != Ordering::Equal,
        (BinaryOp::Ne, None) => true,
        (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
        (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
        (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
        (BinaryOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    }
}

fn as_f64(value: &Scalar) -> f64 {
    match value {
        Scalar::Int(v) => *v as f64,
        Scalar::Float(v) => *v,
        _ => f64::NAN,
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Scalar,
    right: &Scalar,
    expr: &Expr,
    position: usize,
) -> DecodeResult<Scalar> {
    if let (BinaryOp::Add, Scalar::Text(a), Scalar::Text(b)) = (op, left, right) {
        return Ok(Scalar::Text(format!("{}{}", a, b)));
    }

    let non_numeric = || {
        DecodeError::invalid_value(
            position,
            format!(
                "'{}' needs numeric operands, got {} and {}",
                expr,
                left.type_name(),
                right.type_name()
            ),
        )
    };
    let (a, b) = match (left.numeric(), right.numeric()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(non_numeric()),
    };

    if let (Scalar::Int(a), Scalar::Int(b)) = (&a, &b) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                return Err(DecodeError::invalid_value(
                    position,
                    format!("division by zero in '{}'", expr),
                ))
            }
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Rem => a.checked_rem(b),
            BinaryOp::BitAnd => Some(a & b),
            BinaryOp::BitOr => Some(a | b),
            BinaryOp::BitXor => Some(a ^ b),
            BinaryOp::Shl | BinaryOp::Shr => {
                let shift = u32::try_from(b).ok().filter(|s| *s < 128).ok_or_else(|| {
                    DecodeError::invalid_value(
                        position,
                        format!("shift amount {} out of range in '{}'", b, expr),
                    )
                })?;
                if op == BinaryOp::Shl {
                    a.checked_shl(shift)
                } else {
                    a.checked_shr(shift)
                }
            }
            _ => None,
        };
        return result.map(Scalar::Int).ok_or_else(|| overflow(position, expr));
    }

    let (x, y) = (as_f64(&a), as_f64(&b));
    match op {
        BinaryOp::Add => Ok(Scalar::Float(x + y)),
        BinaryOp::Sub => Ok(Scalar::Float(x - y)),
        BinaryOp::Mul => Ok(Scalar::Float(x * y)),
        BinaryOp::Div | BinaryOp::Rem if y == 0.0 => Err(DecodeError::invalid_value(
            position,
            format!("division by zero in '{}'", expr),
        )),
        BinaryOp::Div => Ok(Scalar::Float(x / y)),
        BinaryOp::Rem => Ok(Scalar::Float(x % y)),
        _ => Err(DecodeError::invalid_value(
            position,
            format!("bitwise operator in '{}' needs integer operands", expr),
        )),
    }
}
