//! Expression tree for lengths, counts, offsets and predicates
//!
//! Field references are resolved at compile time to the declaration index
//! of the referenced field; evaluation never looks names up.

use std::fmt;

/// Reference to an earlier field, optionally descending into a nested record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// `Header.Length` is `["Header", "Length"]`
    pub path: Vec<String>,
    /// Declaration index of `path[0]` in the enclosing schema
    pub index: usize,
}

impl FieldRef {
    pub fn root(&self) -> &str {
        &self.path[0]
    }

    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// Compiled expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i128),
    Float(f64),
    Str(String),
    Bool(bool),
    Field(FieldRef),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Literal integer value, if this is one
    pub fn as_constant(&self) -> Option<i128> {
        match self {
            Expr::Integer(v) => Some(*v),
            Expr::Unary(UnaryOp::Neg, inner) => inner.as_constant().map(|v| -v),
            _ => None,
        }
    }

    /// Calls `visit` for every field reference in the tree
    pub fn for_each_ref<F: FnMut(&FieldRef)>(&self, visit: &mut F) {
        match self {
            Expr::Field(r) => visit(r),
            Expr::Unary(_, inner) => inner.for_each_ref(visit),
            Expr::Binary(_, lhs, rhs) => {
                lhs.for_each_ref(visit);
                rhs.for_each_ref(visit);
            }
            _ => {}
        }
    }

    pub fn references_fields(&self) -> bool {
        let mut found = false;
        self.for_each_ref(&mut |_| found = true);
        found
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(v) => write!(f, "{}", v),
            Expr::Float(v) => write!(f, "{}", v),
            Expr::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Field(r) => write!(f, "{}", r.dotted()),
            Expr::Unary(UnaryOp::Neg, inner) => write!(f, "-{}", inner),
            Expr::Unary(UnaryOp::Not, inner) => write!(f, "not {}", inner),
            Expr::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, index: usize) -> Expr {
        Expr::Field(FieldRef {
            path: vec![name.to_string()],
            index,
        })
    }

    #[test]
    fn test_display() {
        let expr = Expr::Binary(
            BinaryOp::Ne,
            Box::new(field("HasPayload", 0)),
            Box::new(Expr::Integer(0)),
        );
        assert_eq!(expr.to_string(), "(HasPayload <> 0)");
    }

    #[test]
    fn test_constants() {
        assert_eq!(Expr::Integer(4).as_constant(), Some(4));
        assert_eq!(
            Expr::Unary(UnaryOp::Neg, Box::new(Expr::Integer(4))).as_constant(),
            Some(-4)
        );
        assert_eq!(field("Count", 0).as_constant(), None);
    }

    #[test]
    fn test_collects_references() {
        let expr = Expr::Binary(
            BinaryOp::Mul,
            Box::new(field("Rows", 1)),
            Box::new(field("Cols", 2)),
        );
        let mut names = Vec::new();
        expr.for_each_ref(&mut |r| names.push(r.dotted()));
        assert_eq!(names, vec!["Rows", "Cols"]);
        assert!(!Expr::Bool(true).references_fields());
    }
}
