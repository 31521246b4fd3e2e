//! Zero-copy byte cursor
//!
//! The cursor borrows its buffer and tracks a byte position plus a sub-byte
//! bit offset. Every read checks bounds before touching the state, so a
//! failed read leaves the cursor exactly where it was.
//!
//! Byte-aligned reads issued while a bit read left a partially consumed
//! byte first skip that byte.

use super::encoding::Encoding;
use super::errors::{DecodeError, DecodeResult};

/// Position and bit offset of a byte cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// Byte position into the buffer
    pub position: usize,
    /// Bits already consumed from the byte at `position` (0..=7)
    pub bit_offset: u8,
}

impl CursorState {
    /// First fully unconsumed byte
    fn aligned_position(&self) -> usize {
        if self.bit_offset > 0 {
            self.position.saturating_add(1)
        } else {
            self.position
        }
    }
}

/// Stateful reader over a borrowed byte span
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    state: CursorState,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            state: CursorState::default(),
        }
    }

    /// Returns the underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the byte position
    pub fn position(&self) -> usize {
        self.state.position
    }

    /// Returns the bit offset within the current byte
    pub fn bit_offset(&self) -> u8 {
        self.state.bit_offset
    }

    /// Returns the full cursor state
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Restores a previously captured state
    pub fn restore(&mut self, state: CursorState) {
        self.state = state;
    }

    /// Returns the number of whole bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.state.aligned_position())
    }

    /// Returns true when no whole byte is left
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes exactly `count` bytes, or fails without moving
    fn take(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        let start = self.state.aligned_position();
        let available = self.data.len().saturating_sub(start);
        if count > available {
            return Err(DecodeError::insufficient_bytes(start, count, available));
        }
        self.state = CursorState {
            position: start + count,
            bit_offset: 0,
        };
        Ok(&self.data[start..start + count])
    }

    fn take_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub fn read_byte(&mut self) -> DecodeResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_sbyte(&mut self) -> DecodeResult<i8> {
        Ok(self.take_array::<1>()?[0] as i8)
    }

    pub fn read_i16_le(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    pub fn read_i16_be(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn read_u16_le(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u16_be(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32_le(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32_be(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_u32_le(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32_be(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn read_i64_le(&mut self) -> DecodeResult<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64_be(&mut self) -> DecodeResult<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn read_u64_le(&mut self) -> DecodeResult<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64_be(&mut self) -> DecodeResult<u64> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    pub fn read_f32_le(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32_be(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_be_bytes(self.take_array()?))
    }

    pub fn read_f64_le(&mut self) -> DecodeResult<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub fn read_f64_be(&mut self) -> DecodeResult<f64> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    /// Copies out exactly `count` bytes
    pub fn read_bytes(&mut self, count: usize) -> DecodeResult<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    /// Borrows exactly `count` bytes without copying
    pub fn read_slice(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        self.take(count)
    }

    /// Decodes exactly `count` bytes as a string
    pub fn read_string(&mut self, count: usize, encoding: Encoding) -> DecodeResult<String> {
        Ok(encoding.decode(self.take(count)?))
    }

    /// Reads a zero-terminated string from a window of at most `max_bytes`
    ///
    /// Advances past the terminator when one is found, otherwise past the
    /// whole window. A window extending beyond the buffer is only an error
    /// when no terminator is found inside the available bytes.
    pub fn read_null_terminated_string(
        &mut self,
        max_bytes: usize,
        encoding: Encoding,
    ) -> DecodeResult<String> {
        let start = self.state.aligned_position();
        let available = self.data.len().saturating_sub(start);
        let window = &self.data[start.min(self.data.len())..][..max_bytes.min(available)];

        match window.iter().position(|&b| b == 0) {
            Some(terminator) => {
                self.take(terminator + 1)?;
                Ok(encoding.decode(&window[..terminator]))
            }
            None => Ok(encoding.decode(self.take(max_bytes)?)),
        }
    }

    /// Reads `bit_count` bits, most significant first
    ///
    /// Starts at the current bit offset and crosses byte boundaries as
    /// needed. Afterwards the cursor points at the first unread bit.
    pub fn read_bits(&mut self, bit_count: u32) -> DecodeResult<u64> {
        if !(1..=64).contains(&bit_count) {
            return Err(DecodeError::bit_count_out_of_range(self.position(), bit_count));
        }

        let CursorState { position, bit_offset } = self.state;
        let total_bits = bit_offset as usize + bit_count as usize;
        let needed = (total_bits + 7) / 8;
        let available = self.data.len().saturating_sub(position);
        if needed > available {
            return Err(DecodeError::insufficient_bytes(position, needed, available));
        }

        let mut value = 0u64;
        for i in 0..bit_count as usize {
            let bit_index = bit_offset as usize + i;
            let byte = self.data[position + bit_index / 8];
            let bit = (byte >> (7 - bit_index % 8)) & 1;
            value = (value << 1) | u64::from(bit);
        }

        self.state = CursorState {
            position: position + total_bits / 8,
            bit_offset: (total_bits % 8) as u8,
        };
        Ok(value)
    }

    /// Advances to the next `bits`-aligned byte boundary
    ///
    /// A partially consumed byte counts as consumed. Calling this on an
    /// aligned cursor is a no-op.
    pub fn align_to_bits(&mut self, bits: u32) -> DecodeResult<()> {
        let boundary = match bits {
            8 | 16 | 32 | 64 => (bits / 8) as usize,
            _ => return Err(DecodeError::invalid_alignment(self.position(), bits)),
        };
        let start = self.state.aligned_position();
        let aligned = start
            .checked_add(boundary - 1)
            .map(|end| end / boundary * boundary)
            .ok_or_else(|| DecodeError::insufficient_bytes(start, boundary, self.remaining()))?;
        self.state = CursorState {
            position: aligned,
            bit_offset: 0,
        };
        Ok(())
    }

    /// Moves to an absolute byte position
    ///
    /// Not bounds-checked here; the next read reports a position past the
    /// end as a structural error.
    pub fn seek_to(&mut self, position: usize) {
        self.state = CursorState {
            position,
            bit_offset: 0,
        };
    }

    /// Fails unless at least `count` whole bytes remain
    pub fn ensure_bytes(&self, count: usize) -> DecodeResult<()> {
        let available = self.remaining();
        if count > available {
            return Err(DecodeError::insufficient_bytes(
                self.state.aligned_position(),
                count,
                available,
            ));
        }
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::DecodeErrorCode;

    #[test]
    fn test_endianness_roundtrip() {
        let value: i32 = -123_456_789;
        let le = value.to_le_bytes();
        let mut reversed = le;
        reversed.reverse();

        let from_le = ByteCursor::new(&le).read_i32_le().unwrap();
        let from_be = ByteCursor::new(&reversed).read_i32_be().unwrap();
        assert_eq!(from_le, value);
        assert_eq!(from_le, from_be);
    }

    #[test]
    fn test_fixed_width_reads_advance() {
        let data = [0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_byte().unwrap(), 1);
        assert_eq!(cursor.read_u16_le().unwrap(), 2);
        assert_eq!(cursor.position(), 3);
        cursor.seek_to(5);
        assert_eq!(cursor.read_f32_le().unwrap(), 1.0);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_short_read_does_not_move() {
        let data = [1u8, 2, 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_byte().unwrap();

        let err = cursor.read_bytes(4).unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeStructural);
        assert_eq!(err.position(), 1);
        assert_eq!(cursor.position(), 1);

        assert!(cursor.read_string(3, Encoding::Utf8).is_err());
        assert!(cursor.read_u32_be().is_err());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_read_bytes_zero() {
        let mut cursor = ByteCursor::new(&[]);
        assert!(cursor.read_bytes(0).unwrap().is_empty());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_bits_match_byte_read() {
        let data = [0b1011_0010u8];
        let mut bitwise = ByteCursor::new(&data);
        let mut value = 0u8;
        for _ in 0..8 {
            value = (value << 1) | bitwise.read_bits(1).unwrap() as u8;
        }
        assert_eq!(value, ByteCursor::new(&data).read_byte().unwrap());
        assert_eq!(bitwise.position(), 1);
        assert_eq!(bitwise.bit_offset(), 0);
    }

    #[test]
    fn test_bits_cross_bytes() {
        let data = [0b1111_0000u8, 0b1010_1010];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_bits(4).unwrap(), 0b1111);
        assert_eq!(cursor.read_bits(8).unwrap(), 0b0000_1010);
        assert_eq!(cursor.state(), CursorState { position: 1, bit_offset: 4 });
        assert_eq!(cursor.read_bits(4).unwrap(), 0b1010);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_bits_full_width() {
        let data = u64::MAX.to_be_bytes();
        assert_eq!(ByteCursor::new(&data).read_bits(64).unwrap(), u64::MAX);
    }

    #[test]
    fn test_bit_count_range() {
        let mut cursor = ByteCursor::new(&[0u8; 16]);
        assert_eq!(
            cursor.read_bits(0).unwrap_err().code(),
            DecodeErrorCode::AeroDecodeBitRange
        );
        assert_eq!(
            cursor.read_bits(65).unwrap_err().code(),
            DecodeErrorCode::AeroDecodeBitRange
        );
    }

    #[test]
    fn test_align_after_residual_bits() {
        let mut cursor = ByteCursor::new(&[0xFF, 0xAB]);
        cursor.read_bits(3).unwrap();
        cursor.align_to_bits(8).unwrap();
        assert_eq!(cursor.state(), CursorState { position: 1, bit_offset: 0 });

        cursor.align_to_bits(8).unwrap();
        assert_eq!(cursor.state(), CursorState { position: 1, bit_offset: 0 });
        assert_eq!(cursor.read_byte().unwrap(), 0xAB);
    }

    #[test]
    fn test_align_near_address_limit_fails_in_place() {
        let mut cursor = ByteCursor::new(&[0u8; 4]);
        cursor.seek_to(usize::MAX - 1);
        let err = cursor.align_to_bits(16).unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeStructural);
        assert_eq!(cursor.position(), usize::MAX - 1);

        cursor.seek_to(usize::MAX);
        cursor.align_to_bits(8).unwrap();
        assert_eq!(cursor.position(), usize::MAX);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_align_wider_boundaries() {
        let mut cursor = ByteCursor::new(&[0u8; 16]);
        cursor.read_byte().unwrap();
        cursor.align_to_bits(32).unwrap();
        assert_eq!(cursor.position(), 4);
        cursor.align_to_bits(64).unwrap();
        assert_eq!(cursor.position(), 8);
        assert_eq!(
            cursor.align_to_bits(12).unwrap_err().code(),
            DecodeErrorCode::AeroDecodeBitRange
        );
    }

    #[test]
    fn test_byte_read_skips_partial_byte() {
        let mut cursor = ByteCursor::new(&[0x80, 0x42]);
        assert_eq!(cursor.read_bits(1).unwrap(), 1);
        assert_eq!(cursor.read_byte().unwrap(), 0x42);
    }

    #[test]
    fn test_null_terminated_string() {
        let data = b"abc\0def";
        let mut cursor = ByteCursor::new(data);
        assert_eq!(cursor.read_null_terminated_string(8, Encoding::Ascii).unwrap(), "abc");
        assert_eq!(cursor.position(), 4);

        let mut cursor = ByteCursor::new(b"abcdef");
        assert_eq!(cursor.read_null_terminated_string(4, Encoding::Utf8).unwrap(), "abcd");
        assert_eq!(cursor.position(), 4);

        let mut cursor = ByteCursor::new(b"ab");
        assert!(cursor.read_null_terminated_string(4, Encoding::Utf8).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_seek_past_end_fails_lazily() {
        let mut cursor = ByteCursor::new(&[1u8, 2]);
        cursor.seek_to(10);
        let err = cursor.read_byte().unwrap_err();
        assert_eq!(err.position(), 10);
        assert!(err.message().contains("0 available"));
    }

    #[test]
    fn test_ensure_and_validate() {
        let cursor = ByteCursor::new(&[1u8, 2]);
        assert!(cursor.ensure_bytes(2).is_ok());
        assert!(cursor.ensure_bytes(3).is_err());

        let err = cursor.validate(false, "Magic", "bad magic").unwrap_err();
        assert_eq!(err.code(), DecodeErrorCode::AeroDecodeValidationFailed);
        assert_eq!(err.field(), Some("Magic"));
    }
}
