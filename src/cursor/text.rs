//! Character cursor over borrowed text
//!
//! Positions are counted in characters. The cursor also keeps the byte
//! offset into the UTF-8 input so slicing stays zero-copy; callers only
//! ever see the character position.

use regex::Regex;

use super::errors::{DecodeError, DecodeResult};

/// Trimming and casing applied to a text value
///
/// Trimming happens first, then casing. When both `lower` and `upper` are
/// set, `lower` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextModifiers {
    pub ltrim: bool,
    pub rtrim: bool,
    pub lower: bool,
    pub upper: bool,
}

impl TextModifiers {
    /// No trimming, no casing
    pub const NONE: TextModifiers = TextModifiers {
        ltrim: false,
        rtrim: false,
        lower: false,
        upper: false,
    };

    /// Trim both ends
    pub const TRIM: TextModifiers = TextModifiers {
        ltrim: true,
        rtrim: true,
        lower: false,
        upper: false,
    };

    /// Returns true when no modifier is set
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Applies the modifiers to `value`
    pub fn apply(&self, value: &str) -> String {
        let mut trimmed = value;
        if self.ltrim {
            trimmed = trimmed.trim_start();
        }
        if self.rtrim {
            trimmed = trimmed.trim_end();
        }
        if self.lower {
            trimmed.to_lowercase()
        } else if self.upper {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }
}

/// Options for [`TextCursor::read_until`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UntilOptions {
    pub modifiers: TextModifiers,
    /// Advance past the delimiter (otherwise stop right before it)
    pub consume_delimiter: bool,
}

impl Default for UntilOptions {
    fn default() -> Self {
        Self {
            modifiers: TextModifiers::NONE,
            consume_delimiter: true,
        }
    }
}

/// Options for [`TextCursor::read_between`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BetweenOptions {
    pub modifiers: TextModifiers,
    /// Inner `open` delimiters must be balanced by `close` first
    pub nested: bool,
    /// A `close` preceded by an odd run of backslashes does not count
    pub escaped: bool,
}

/// Builds a regex anchored at the cursor
///
/// A pattern that already starts with `^` is used as-is.
pub fn anchor_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.starts_with('^') {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("^(?:{})", pattern))
    }
}

/// Number of consecutive backslashes ending right before byte `index`
fn preceding_backslashes(text: &str, index: usize) -> usize {
    text.as_bytes()[..index]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
}

/// Position of a text cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextCursorState {
    position: usize,
    offset: usize,
}

/// Stateful reader over a borrowed string
#[derive(Debug, Clone)]
pub struct TextCursor<'a> {
    input: &'a str,
    state: TextCursorState,
}

impl<'a> TextCursor<'a> {
    /// Creates a cursor at the start of `input`
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            state: TextCursorState::default(),
        }
    }

    /// Returns the character position
    pub fn position(&self) -> usize {
        self.state.position
    }

    /// Returns the full cursor state
    pub fn state(&self) -> TextCursorState {
        self.state
    }

    /// Restores a previously captured state
    pub fn restore(&mut self, state: TextCursorState) {
        self.state = state;
    }

    /// Returns the unread input
    pub fn rest(&self) -> &'a str {
        &self.input[self.state.offset..]
    }

    /// Returns the number of unread characters
    pub fn remaining(&self) -> usize {
        self.rest().chars().count()
    }

    /// Advances by `bytes` bytes of the unread input, returning them
    fn advance(&mut self, bytes: usize) -> &'a str {
        let consumed = &self.rest()[..bytes];
        self.state.position += consumed.chars().count();
        self.state.offset += bytes;
        consumed
    }

    /// Reads up to `delimiter`
    pub fn read_until(&mut self, delimiter: &str, options: UntilOptions) -> DecodeResult<String> {
        if delimiter.is_empty() {
            return Err(DecodeError::invalid_value(self.position(), "empty 'until' delimiter"));
        }
        let rest = self.rest();
        let index = rest
            .find(delimiter)
            .ok_or_else(|| DecodeError::delimiter_not_found(self.position(), delimiter))?;

        let value = self.advance(index);
        if options.consume_delimiter {
            self.advance(delimiter.len());
        }
        Ok(options.modifiers.apply(value))
    }

    /// Reads the content between `open` (at the cursor) and its matching `close`
    pub fn read_between(
        &mut self,
        open: &str,
        close: &str,
        options: BetweenOptions,
    ) -> DecodeResult<String> {
        if open.is_empty() || close.is_empty() {
            return Err(DecodeError::invalid_value(self.position(), "empty 'between' delimiter"));
        }
        let rest = self.rest();
        if !rest.starts_with(open) {
            return Err(DecodeError::delimiter_not_found(self.position(), open));
        }

        let body = &rest[open.len()..];
        let mut depth = 1usize;
        let mut index = 0usize;
        while index < body.len() {
            let tail = &body[index..];
            let escaped = options.escaped && preceding_backslashes(body, index) % 2 == 1;

            if !escaped && tail.starts_with(close) {
                depth -= 1;
                if depth == 0 {
                    let content = &body[..index];
                    self.advance(open.len() + index + close.len());
                    return Ok(options.modifiers.apply(content));
                }
                index += close.len();
                continue;
            }
            if !escaped && options.nested && tail.starts_with(open) {
                depth += 1;
                index += open.len();
                continue;
            }
            index += tail.chars().next().map_or(1, char::len_utf8);
        }

        Err(DecodeError::delimiter_not_found(self.position(), close))
    }

    /// Reads exactly `count` characters
    pub fn read_chars(&mut self, count: usize, modifiers: TextModifiers) -> DecodeResult<String> {
        let rest = self.rest();
        let end = match rest.char_indices().nth(count) {
            Some((index, _)) => index,
            None => {
                let available = rest.chars().count();
                if count > available {
                    return Err(DecodeError::insufficient_chars(self.position(), count, available));
                }
                rest.len()
            }
        };
        Ok(modifiers.apply(self.advance(end)))
    }

    /// Reads up to the first whitespace character or end of input
    pub fn read_token(&mut self, modifiers: TextModifiers) -> DecodeResult<String> {
        let end = self
            .rest()
            .find(char::is_whitespace)
            .unwrap_or_else(|| self.rest().len());
        Ok(modifiers.apply(self.advance(end)))
    }

    /// Consumes everything that is left
    pub fn read_rest(&mut self, modifiers: TextModifiers) -> DecodeResult<String> {
        let end = self.rest().len();
        Ok(modifiers.apply(self.advance(end)))
    }

    /// Reads the text matched by an anchored `pattern` at the cursor
    ///
    /// `pattern` should come from [`anchor_pattern`]; a match that does not
    /// begin exactly at the cursor is rejected either way.
    pub fn read_pattern(&mut self, pattern: &Regex, modifiers: TextModifiers) -> DecodeResult<String> {
        match pattern.find(self.rest()) {
            Some(m) if m.start() == 0 => Ok(modifiers.apply(self.advance(m.end()))),
            _ => Err(DecodeError::pattern_mismatch(self.position(), pattern.as_str())),
        }
    }

    /// Consumes a run of whitespace, returning it
    pub fn skip_whitespace(&mut self, required: bool) -> DecodeResult<String> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        if required && end == 0 {
            return Err(DecodeError::whitespace_required(self.position()));
        }
        Ok(self.advance(end).to_string())
    }

    /// Consumes at most one whitespace character
    pub fn skip_optional_whitespace(&mut self) -> String {
        match self.rest().chars().next() {
            Some(c) if c.is_whitespace() => self.advance(c.len_utf8()).to_string(),
            _ => String::new(),
        }
    }

    /// Requires `literal` at the cursor and consumes it
    pub fn expect_literal(&mut self, literal: &str) -> DecodeResult<String> {
        if !self.rest().starts_with(literal) {
            return Err(DecodeError::literal_mismatch(self.position(), literal));
        }
        Ok(self.advance(literal.len()).to_string())
    }

    pub fn is_at_end(&self) -> bool {
        self.rest().is_empty()
    }

    pub fn lookahead_matches(&self, text: &str) -> bool {
        self.rest().starts_with(text)
    }

    pub fn lookahead_matches_pattern(&self, pattern: &Regex) -> bool {
        pattern.find(self.rest()).map_or(false, |m| m.start() == 0)
    }

    /// Applies trimming then casing
    pub fn apply_modifiers(value: &str, modifiers: TextModifiers) -> String {
        modifiers.apply(value)
    }

    /// Fails with a validation error when `condition` is false
    pub fn validate(&self, condition: bool, field: &str, message: &str) -> DecodeResult<()> {
        if condition {
            Ok(())
        } else {
            Err(DecodeError::validation_failed(field, self.position(), message))
        }
    }
}
