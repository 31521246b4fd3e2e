//! Tokenizer for the layout DSL
//!
//! Comments run from `//`, or from `--` at the start of input or after
//! whitespace, to the end of the line; `A--1` is `A - -1`. String literals
//! use single or double quotes; `\'`, `\"`, `\\`, `\t`, `\n` and `\r` are
//! unescaped, any other backslash sequence is kept verbatim so regex
//! classes such as `\d` survive.

use super::errors::{SchemaError, SchemaResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Integer(i128),
    Float(f64),
    Str(String),
    Punct(&'static str),
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Integer(v) => v.to_string(),
            TokenKind::Float(v) => v.to_string(),
            TokenKind::Str(s) => format!("string '{}'", s),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Two-character operators, checked before single characters
const DOUBLE_PUNCT: [&str; 7] = ["<<", ">>", "==", "<>", "!=", "<=", ">="];

const SINGLE_PUNCT: [&str; 22] = [
    "{", "}", "[", "]", "(", ")", ",", ";", ":", ".", "+", "-", "*", "/", "%", "&", "|", "^", "=",
    "<", ">", "?",
];

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

/// Splits DSL source into tokens, ending with [`TokenKind::Eof`]
pub fn tokenize(source: &str) -> SchemaResult<Vec<Token>> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_trivia();
        let (line, column) = (lexer.line, lexer.column);
        let kind = match lexer.peek(0) {
            None => {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => lexer.ident(),
            Some(c) if c.is_ascii_digit() => lexer.number(line, column)?,
            Some(c) if c == '\'' || c == '"' => lexer.string(c, line, column)?,
            Some(_) => lexer.punct(line, column)?,
        };
        tokens.push(Token { kind, line, column });
    }
}

impl Lexer {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('-'), Some('-')) if self.at_token_boundary() => self.skip_line(),
                (Some('/'), Some('/')) => self.skip_line(),
                _ => return,
            }
        }
    }

    /// True at the start of input or right after whitespace
    fn at_token_boundary(&self) -> bool {
        self.pos == 0 || self.chars[self.pos - 1].is_whitespace()
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn ident(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(name)
    }

    fn number(&mut self, line: usize, column: usize) -> SchemaResult<TokenKind> {
        if self.peek(0) == Some('0') && matches!(self.peek(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek(0) {
                if c.is_ascii_hexdigit() || c == '_' {
                    if c != '_' {
                        digits.push(c);
                    }
                    self.bump();
                } else {
                    break;
                }
            }
            return i128::from_str_radix(&digits, 16)
                .map(TokenKind::Integer)
                .map_err(|_| SchemaError::syntax(line, column, "malformed hex literal"));
        }

        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }
        let fractional = self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit());
        if fractional {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek(0) {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            return text
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| SchemaError::syntax(line, column, "malformed number"));
        }
        text.parse::<i128>()
            .map(TokenKind::Integer)
            .map_err(|_| SchemaError::syntax(line, column, "integer literal out of range"))
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> SchemaResult<TokenKind> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(SchemaError::syntax(line, column, "unterminated string literal")),
                Some(c) if c == quote => return Ok(TokenKind::Str(value)),
                Some('\\') => match self.bump() {
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('t') => value.push('\t'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(SchemaError::syntax(line, column, "unterminated string literal"))
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn punct(&mut self, line: usize, column: usize) -> SchemaResult<TokenKind> {
        if let (Some(a), Some(b)) = (self.peek(0), self.peek(1)) {
            let pair: String = [a, b].iter().collect();
            if let Some(p) = DOUBLE_PUNCT.iter().find(|p| **p == pair) {
                self.bump();
                self.bump();
                return Ok(TokenKind::Punct(p));
            }
        }
        let c = self.peek(0).map(String::from).unwrap_or_default();
        match SINGLE_PUNCT.iter().find(|p| **p == c) {
            Some(p) => {
                self.bump();
                Ok(TokenKind::Punct(p))
            }
            None => Err(SchemaError::syntax(
                line,
                column,
                format!("unexpected character '{}'", c),
            )),
        }
    }
}
