//! Recursive-descent parser for the layout DSL
//!
//! Parsing is two-phase. [`scan_headers`] walks the token stream at brace
//! depth zero and collects every `binary Name` / `text Name` header so the
//! registry can assign ids before any body is parsed. [`Parser`] then
//! compiles each body against that symbol table, resolving nested and
//! embedded schema names to ids and field references to declaration
//! indices.
//!
//! # Invariants
//!
//! - Expressions only reference fields declared strictly earlier
//!   (`check` may also reference the field it guards)
//! - Nested/embedded references name a schema of the required kind
//! - Field names are unique within a schema, except the placeholder `_`

use std::collections::HashMap;

use crate::cursor::{anchor_pattern, Encoding, TextModifiers};

use super::errors::{SchemaError, SchemaResult};
use super::expr::{BinaryOp, Expr, FieldRef, UnaryOp};
use super::lexer::{Token, TokenKind};
use super::types::{
    BinaryFieldKind, Endianness, FieldKind, FieldSpec, PrimitiveType, SchemaDefinition,
    SchemaKind, SchemaRef, TextFieldKind, PLACEHOLDER,
};

/// Name, kind and location of a schema declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHeader {
    pub name: String,
    pub kind: SchemaKind,
    pub line: usize,
    pub column: usize,
}

fn schema_kind_keyword(kind: &TokenKind) -> Option<SchemaKind> {
    match kind {
        TokenKind::Ident(word) if word == "binary" => Some(SchemaKind::Binary),
        TokenKind::Ident(word) if word == "text" => Some(SchemaKind::Text),
        _ => None,
    }
}

/// Collects schema headers declared at the top level of a token stream
pub fn scan_headers(tokens: &[Token]) -> Vec<SchemaHeader> {
    let mut headers = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i].kind {
            TokenKind::Punct("{") => depth += 1,
            TokenKind::Punct("}") => depth = depth.saturating_sub(1),
            kind if depth == 0 => {
                if let (Some(schema_kind), Some(TokenKind::Ident(name))) =
                    (schema_kind_keyword(kind), tokens.get(i + 1).map(|t| &t.kind))
                {
                    headers.push(SchemaHeader {
                        name: name.clone(),
                        kind: schema_kind,
                        line: tokens[i].line,
                        column: tokens[i].column,
                    });
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    headers
}

/// Attributes that may follow a field's type, in any order
#[derive(Default)]
struct FieldAttributes {
    endianness: Option<Endianness>,
    encoding: Option<Encoding>,
    modifiers: TextModifiers,
    null_terminated: bool,
    nested: bool,
    escaped: bool,
    embedded: Option<String>,
    at: Option<Expr>,
    when: Option<Expr>,
    check: Option<Expr>,
}

/// Field type as written, before attributes are applied
enum BinaryHead {
    Primitive(PrimitiveType, Option<Expr>),
    Str(Expr),
    Bits(u32),
    Align(u32),
    Schema(SchemaRef, Option<Expr>),
}

enum TextHead {
    Until(String),
    Between(String, String),
    Pattern(String),
    Literal(String),
    Chars(Expr),
    Token,
    Whitespace(bool),
    Rest,
    Schema(SchemaRef, Option<Expr>),
}

/// Fields declared so far in the schema being parsed
struct FieldScope {
    names: HashMap<String, usize>,
    /// Field currently being parsed, visible only to `check`
    current: Option<(String, usize)>,
    allow_current: bool,
}

impl FieldScope {
    fn resolve(&self, path: Vec<String>) -> SchemaResult<FieldRef> {
        let root = &path[0];
        if let Some(&index) = self.names.get(root) {
            return Ok(FieldRef { path, index });
        }
        if self.allow_current {
            if let Some((ref name, index)) = self.current {
                if name == root {
                    return Ok(FieldRef { path, index });
                }
            }
        }
        Err(SchemaError::unknown_field(&path.join(".")))
    }
}

/// Compiles schema bodies against a symbol table of known schemas
pub struct Parser<'t, 's> {
    tokens: &'t [Token],
    pos: usize,
    symbols: &'s HashMap<String, SchemaRef>,
    default_endianness: Endianness,
}

impl<'t, 's> Parser<'t, 's> {
    pub fn new(
        tokens: &'t [Token],
        symbols: &'s HashMap<String, SchemaRef>,
        default_endianness: Endianness,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            symbols,
            default_endianness,
        }
    }

    /// Parses every schema in the token stream
    pub fn parse_all(&mut self) -> SchemaResult<Vec<SchemaDefinition>> {
        let mut schemas = Vec::new();
        loop {
            while self.eat_punct(";") {}
            if self.peek().kind == TokenKind::Eof {
                return Ok(schemas);
            }
            schemas.push(self.parse_schema()?);
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) -> &'t Token {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> SchemaError {
        let token = self.peek();
        SchemaError::syntax(token.line, token.column, message)
    }

    fn unexpected(&self, expected: &str) -> SchemaError {
        self.error_here(format!(
            "expected {}, found {}",
            expected,
            self.peek().kind.describe()
        ))
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(p) if p == punct)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> SchemaResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(word) if word == keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> SchemaResult<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_str(&mut self, what: &str) -> SchemaResult<String> {
        match &self.peek().kind {
            TokenKind::Str(value) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_constant(&mut self, what: &str) -> SchemaResult<i128> {
        match self.peek().kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    // =========================================================================
    // Schemas and fields
    // =========================================================================

    fn parse_schema(&mut self) -> SchemaResult<SchemaDefinition> {
        let kind = schema_kind_keyword(&self.peek().kind)
            .ok_or_else(|| self.unexpected("'binary' or 'text'"))?;
        self.advance();
        let name = self.expect_ident("schema name")?;
        let reference = self
            .symbols
            .get(&name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_reference(&name))?;

        self.expect_punct("{")
            .map_err(|e| e.in_schema(&name))?;

        let mut scope = FieldScope {
            names: HashMap::new(),
            current: None,
            allow_current: false,
        };
        let mut fields = Vec::new();
        while !self.is_punct("}") {
            let field = self
                .parse_field(kind, fields.len(), &mut scope)
                .map_err(|e| e.in_schema(&name))?;
            fields.push(field);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}").map_err(|e| e.in_schema(&name))?;
        if fields.is_empty() {
            return Err(SchemaError::invalid_field("schema declares no fields").in_schema(&name));
        }

        Ok(SchemaDefinition {
            name,
            kind,
            id: reference.id,
            fields,
        })
    }

    fn parse_field(
        &mut self,
        kind: SchemaKind,
        index: usize,
        scope: &mut FieldScope,
    ) -> SchemaResult<FieldSpec> {
        let start = self.peek();
        let name = self.expect_ident("field name")?;
        let locate = |e: SchemaError| e.in_field(&name).at(start.line, start.column);

        if name != PLACEHOLDER && scope.names.contains_key(&name) {
            return Err(locate(SchemaError::duplicate_field(&name)));
        }
        self.expect_punct(":").map_err(locate)?;

        scope.current = Some((name.clone(), index));
        let field = match kind {
            SchemaKind::Binary => self.parse_binary_field(&name, index, scope),
            SchemaKind::Text => self.parse_text_field(&name, index, scope),
        }
        .map_err(locate)?;
        scope.current = None;

        if !field.is_placeholder() {
            scope.names.insert(name, index);
        }
        Ok(field)
    }

    fn parse_binary_field(
        &mut self,
        name: &str,
        index: usize,
        scope: &mut FieldScope,
    ) -> SchemaResult<FieldSpec> {
        let keyword = self.expect_ident("field type")?;
        let head = match keyword.as_str() {
            "string" => BinaryHead::Str(self.parse_bracketed(scope)?),
            "bits" => {
                let width = self.parse_bracketed_constant("bit width")?;
                if !(1..=64).contains(&width) {
                    return Err(SchemaError::invalid_field(format!(
                        "bit width must be between 1 and 64, got {}",
                        width
                    )));
                }
                BinaryHead::Bits(width as u32)
            }
            "align" => {
                let bits = self.parse_bracketed_constant("alignment")?;
                if ![8, 16, 32, 64].contains(&bits) {
                    return Err(SchemaError::invalid_field(format!(
                        "alignment must be 8, 16, 32 or 64 bits, got {}",
                        bits
                    )));
                }
                BinaryHead::Align(bits as u32)
            }
            other => match PrimitiveType::from_keyword(other) {
                Some(ty) => BinaryHead::Primitive(ty, self.parse_optional_bracketed(scope)?),
                None => {
                    let schema = self.resolve_schema(other, SchemaKind::Binary)?;
                    BinaryHead::Schema(schema, self.parse_optional_bracketed(scope)?)
                }
            },
        };

        let attrs = self.parse_attributes(scope)?;
        let mut embedded = None;

        let kind = match head {
            BinaryHead::Primitive(PrimitiveType::Byte, Some(length)) => {
                self.reject_text_attributes(&attrs, "byte blob")?;
                reject(attrs.endianness.is_some(), "byte order does not apply to byte blobs")?;
                if let Some(ref target) = attrs.embedded {
                    embedded = Some(self.resolve_schema(target, SchemaKind::Binary)?);
                }
                BinaryFieldKind::Bytes { length }
            }
            BinaryHead::Primitive(ty, count) => {
                self.reject_text_attributes(&attrs, ty.as_str())?;
                reject(attrs.embedded.is_some(), "only strings and byte blobs support 'as'")?;
                let endianness = attrs.endianness.unwrap_or(self.default_endianness);
                match count {
                    Some(count) => BinaryFieldKind::PrimitiveArray {
                        ty,
                        endianness,
                        count,
                    },
                    None => BinaryFieldKind::Primitive { ty, endianness },
                }
            }
            BinaryHead::Str(length) => {
                reject(attrs.endianness.is_some(), "byte order does not apply to strings")?;
                reject(
                    attrs.nested || attrs.escaped,
                    "'nested' and 'escaped' only apply to text 'between' fields",
                )?;
                if let Some(ref target) = attrs.embedded {
                    embedded = Some(self.resolve_schema(target, SchemaKind::Text)?);
                }
                BinaryFieldKind::String {
                    length,
                    encoding: attrs.encoding.unwrap_or_default(),
                    null_terminated: attrs.null_terminated,
                }
            }
            BinaryHead::Bits(width) => {
                self.reject_text_attributes(&attrs, "bit field")?;
                reject(attrs.endianness.is_some(), "byte order does not apply to bit fields")?;
                reject(attrs.embedded.is_some(), "only strings and byte blobs support 'as'")?;
                BinaryFieldKind::Bits { width }
            }
            BinaryHead::Align(bits) => {
                self.reject_text_attributes(&attrs, "alignment")?;
                reject(attrs.endianness.is_some(), "byte order does not apply to alignment")?;
                reject(attrs.embedded.is_some(), "only strings and byte blobs support 'as'")?;
                reject(attrs.check.is_some(), "alignment fields cannot be checked")?;
                BinaryFieldKind::Align { bits }
            }
            BinaryHead::Schema(schema, count) => {
                self.reject_text_attributes(&attrs, "nested schema")?;
                reject(attrs.endianness.is_some(), "byte order is declared by the nested schema")?;
                reject(attrs.embedded.is_some(), "only strings and byte blobs support 'as'")?;
                match count {
                    Some(count) => BinaryFieldKind::NestedArray { schema, count },
                    None => BinaryFieldKind::Nested { schema },
                }
            }
        };

        Ok(FieldSpec {
            name: name.to_string(),
            index,
            kind: FieldKind::Binary(kind),
            modifiers: attrs.modifiers,
            embedded,
            when: attrs.when,
            at: attrs.at,
            check: attrs.check,
        })
    }

    fn parse_text_field(
        &mut self,
        name: &str,
        index: usize,
        scope: &mut FieldScope,
    ) -> SchemaResult<FieldSpec> {
        let keyword = self.expect_ident("field kind")?;
        let head = match keyword.as_str() {
            "until" => TextHead::Until(self.expect_str("delimiter string")?),
            "between" => {
                let open = self.expect_str("opening delimiter")?;
                let close = self.expect_str("closing delimiter")?;
                TextHead::Between(open, close)
            }
            "pattern" => TextHead::Pattern(self.expect_str("pattern string")?),
            "literal" => TextHead::Literal(self.expect_str("literal string")?),
            "chars" => TextHead::Chars(self.parse_bracketed(scope)?),
            "token" => TextHead::Token,
            "whitespace" => TextHead::Whitespace(self.eat_punct("?")),
            "rest" => TextHead::Rest,
            other => {
                let schema = self.resolve_schema(other, SchemaKind::Text)?;
                TextHead::Schema(schema, self.parse_optional_bracketed(scope)?)
            }
        };

        let empty_delimiter = match &head {
            TextHead::Until(text) | TextHead::Literal(text) => text.is_empty(),
            TextHead::Between(open, close) => open.is_empty() || close.is_empty(),
            _ => false,
        };
        reject(empty_delimiter, "delimiters and literals cannot be empty")?;

        let attrs = self.parse_attributes(scope)?;
        reject(attrs.at.is_some(), "'at' only applies to binary fields")?;
        reject(attrs.endianness.is_some(), "byte order only applies to binary fields")?;
        reject(
            attrs.encoding.is_some() || attrs.null_terminated,
            "encodings and 'nullterm' only apply to binary strings",
        )?;
        if !matches!(head, TextHead::Between(..)) {
            reject(
                attrs.nested || attrs.escaped,
                "'nested' and 'escaped' only apply to 'between' fields",
            )?;
        }

        let produces_string = !matches!(
            head,
            TextHead::Literal(_) | TextHead::Whitespace(_) | TextHead::Schema(..)
        );
        if !produces_string {
            reject(
                !attrs.modifiers.is_empty(),
                "trim and case modifiers only apply to string-producing fields",
            )?;
            reject(attrs.embedded.is_some(), "'as' only applies to string-producing fields")?;
        }
        let embedded = match attrs.embedded {
            Some(ref target) => Some(self.resolve_schema(target, SchemaKind::Text)?),
            None => None,
        };

        let kind = match head {
            TextHead::Until(delimiter) => TextFieldKind::Until { delimiter },
            TextHead::Between(open, close) => TextFieldKind::Between {
                open,
                close,
                nested: attrs.nested,
                escaped: attrs.escaped,
            },
            TextHead::Pattern(source) => {
                let regex = anchor_pattern(&source).map_err(|e| {
                    SchemaError::invalid_field(format!("invalid pattern '{}': {}", source, e))
                })?;
                TextFieldKind::Pattern { source, regex }
            }
            TextHead::Literal(text) => TextFieldKind::Literal { text },
            TextHead::Chars(count) => TextFieldKind::Chars { count },
            TextHead::Token => TextFieldKind::Token,
            TextHead::Whitespace(optional) => TextFieldKind::Whitespace { optional },
            TextHead::Rest => TextFieldKind::Rest,
            TextHead::Schema(schema, Some(count)) => TextFieldKind::NestedArray { schema, count },
            TextHead::Schema(schema, None) => TextFieldKind::Nested { schema },
        };

        Ok(FieldSpec {
            name: name.to_string(),
            index,
            kind: FieldKind::Text(kind),
            modifiers: attrs.modifiers,
            embedded,
            when: attrs.when,
            at: None,
            check: attrs.check,
        })
    }

    fn reject_text_attributes(&self, attrs: &FieldAttributes, what: &str) -> SchemaResult<()> {
        reject(
            attrs.encoding.is_some() || attrs.null_terminated,
            &format!("encodings and 'nullterm' do not apply to {}", what),
        )?;
        reject(
            !attrs.modifiers.is_empty(),
            &format!("trim and case modifiers do not apply to {}", what),
        )?;
        reject(
            attrs.nested || attrs.escaped,
            "'nested' and 'escaped' only apply to text 'between' fields",
        )
    }

    fn resolve_schema(&self, name: &str, expected: SchemaKind) -> SchemaResult<SchemaRef> {
        let schema = self
            .symbols
            .get(name)
            .ok_or_else(|| SchemaError::unknown_reference(name))?;
        if schema.kind != expected {
            return Err(SchemaError::kind_mismatch(
                name,
                expected.as_str(),
                schema.kind.as_str(),
            ));
        }
        Ok(schema.clone())
    }

    fn parse_bracketed(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        self.expect_punct("[")?;
        let expr = self.parse_expr(scope)?;
        self.expect_punct("]")?;
        Ok(expr)
    }

    fn parse_optional_bracketed(&mut self, scope: &FieldScope) -> SchemaResult<Option<Expr>> {
        if self.is_punct("[") {
            self.parse_bracketed(scope).map(Some)
        } else {
            Ok(None)
        }
    }

    fn parse_bracketed_constant(&mut self, what: &str) -> SchemaResult<i128> {
        self.expect_punct("[")?;
        let value = self.expect_constant(what)?;
        self.expect_punct("]")?;
        Ok(value)
    }

    fn parse_attributes(&mut self, scope: &mut FieldScope) -> SchemaResult<FieldAttributes> {
        let mut attrs = FieldAttributes::default();
        loop {
            let word = match &self.peek().kind {
                TokenKind::Ident(word) => word.clone(),
                _ => return Ok(attrs),
            };
            let token = self.peek();
            let duplicate =
                || SchemaError::syntax(token.line, token.column, format!("'{}' given twice", word));

            if let Some(endianness) = Endianness::from_keyword(&word) {
                if attrs.endianness.replace(endianness).is_some() {
                    return Err(duplicate());
                }
                self.advance();
                continue;
            }
            if let Some(encoding) = Encoding::from_keyword(&word) {
                if attrs.encoding.replace(encoding).is_some() {
                    return Err(duplicate());
                }
                self.advance();
                continue;
            }

            match word.as_str() {
                "trim" => {
                    attrs.modifiers.ltrim = true;
                    attrs.modifiers.rtrim = true;
                }
                "ltrim" => attrs.modifiers.ltrim = true,
                "rtrim" => attrs.modifiers.rtrim = true,
                "lower" => attrs.modifiers.lower = true,
                "upper" => attrs.modifiers.upper = true,
                "nullterm" => attrs.null_terminated = true,
                "nested" => attrs.nested = true,
                "escaped" => attrs.escaped = true,
                "as" => {
                    self.advance();
                    let target = self.expect_ident("schema name after 'as'")?;
                    if attrs.embedded.replace(target).is_some() {
                        return Err(duplicate());
                    }
                    continue;
                }
                "at" | "when" => {
                    self.advance();
                    let expr = self.parse_expr(scope)?;
                    let slot = if word == "at" { &mut attrs.at } else { &mut attrs.when };
                    if slot.replace(expr).is_some() {
                        return Err(duplicate());
                    }
                    continue;
                }
                "check" => {
                    self.advance();
                    scope.allow_current = true;
                    let expr = self.parse_expr(scope);
                    scope.allow_current = false;
                    if attrs.check.replace(expr?).is_some() {
                        return Err(duplicate());
                    }
                    continue;
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
            self.advance();
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expr(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        self.parse_or(scope)
    }

    fn parse_or(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        let mut lhs = self.parse_and(scope)?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and(scope)?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        let mut lhs = self.parse_not(scope)?;
        while self.eat_keyword("and") {
            let rhs = self.parse_not(scope)?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        if self.eat_keyword("not") {
            let inner = self.parse_not(scope)?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        self.parse_comparison(scope)
    }

    fn parse_comparison(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        let mut lhs = self.parse_binary_level(scope, 0)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct("=") | TokenKind::Punct("==") => BinaryOp::Eq,
                TokenKind::Punct("<>") | TokenKind::Punct("!=") => BinaryOp::Ne,
                TokenKind::Punct("<") => BinaryOp::Lt,
                TokenKind::Punct("<=") => BinaryOp::Le,
                TokenKind::Punct(">") => BinaryOp::Gt,
                TokenKind::Punct(">=") => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_binary_level(scope, 0)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    /// Left-associative levels from loosest (`|`) to tightest (`* / %`)
    fn parse_binary_level(&mut self, scope: &FieldScope, level: usize) -> SchemaResult<Expr> {
        const LEVELS: [&[(&str, BinaryOp)]; 6] = [
            &[("|", BinaryOp::BitOr)],
            &[("^", BinaryOp::BitXor)],
            &[("&", BinaryOp::BitAnd)],
            &[("<<", BinaryOp::Shl), (">>", BinaryOp::Shr)],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
        ];
        if level == LEVELS.len() {
            return self.parse_unary(scope);
        }

        let mut lhs = self.parse_binary_level(scope, level + 1)?;
        'outer: loop {
            for (symbol, op) in LEVELS[level] {
                if self.eat_punct(symbol) {
                    let rhs = self.parse_binary_level(scope, level + 1)?;
                    lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_unary(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        if self.eat_punct("-") {
            let inner = self.parse_unary(scope)?;
            return Ok(match inner {
                Expr::Integer(v) => Expr::Integer(-v),
                Expr::Float(v) => Expr::Float(-v),
                other => Expr::Unary(UnaryOp::Neg, Box::new(other)),
            });
        }
        self.parse_primary(scope)
    }

    fn parse_primary(&mut self, scope: &FieldScope) -> SchemaResult<Expr> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Integer(v) => {
                self.advance();
                Ok(Expr::Integer(*v))
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(Expr::Float(*v))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s.clone()))
            }
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.parse_expr(scope)?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            TokenKind::Ident(word) if word == "true" || word == "false" => {
                self.advance();
                Ok(Expr::Bool(word == "true"))
            }
            TokenKind::Ident(first) => {
                self.advance();
                let mut path = vec![first.clone()];
                while self.eat_punct(".") {
                    path.push(self.expect_ident("field name after '.'")?);
                }
                scope
                    .resolve(path)
                    .map(Expr::Field)
                    .map_err(|e| e.at(token.line, token.column))
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn reject(condition: bool, message: &str) -> SchemaResult<()> {
    if condition {
        Err(SchemaError::invalid_field(message))
    } else {
        Ok(())
    }
}
