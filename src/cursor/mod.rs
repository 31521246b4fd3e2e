//! Cursor primitives for structural decoding
//!
//! Two parallel primitive sets:
//!
//! - [`ByteCursor`]: byte position plus bit offset over a borrowed `[u8]`
//! - [`TextCursor`]: character position over a borrowed `str`
//!
//! # Invariants
//!
//! - Cursors never own their input
//! - A failed read leaves the cursor state unchanged
//! - Position only moves backwards through an explicit seek/restore
//! - The bit offset resets to 0 on any byte-aligned read or seek

mod bytes;
mod encoding;
mod errors;
mod text;

pub use bytes::{ByteCursor, CursorState};
pub use encoding::Encoding;
pub use errors::{DecodeError, DecodeErrorCode, DecodeResult};
pub use text::{anchor_pattern, BetweenOptions, TextCursor, TextCursorState, TextModifiers, UntilOptions};
