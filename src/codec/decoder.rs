//! Row decoder

use crate::error::{Result, TableError};

use super::overrun;

/// Reads typed fields from a row buffer at an advancing cursor
pub struct Decoder<'a> {
    buffer: &'a [u8],
    pos: usize,
}

macro_rules! decode_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                let mut raw = [0u8; WIDTH];
                raw.copy_from_slice(self.take(WIDTH)?);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

impl<'a> Decoder<'a> {
    /// Start decoding at the beginning of `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8]> {
        if width > self.remaining() {
            return Err(overrun("read", self.pos, width, self.buffer.len()));
        }
        let buffer: &'a [u8] = self.buffer;
        let start = self.pos;
        self.pos += width;
        Ok(&buffer[start..start + width])
    }

    /// Read `size` bytes and strip trailing zero padding
    ///
    /// Strings that themselves end in NUL bytes lose them.
    pub fn decode_string_padded(&mut self, size: usize) -> Result<String> {
        let raw = self.take(size)?;
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8(raw[..end].to_vec()).map_err(|e| {
            TableError::Schema(format!(
                "string column at offset {} is not valid UTF-8: {}",
                self.pos - size,
                e
            ))
        })
    }

    /// Borrow `size` raw bytes
    pub fn decode_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        self.take(size)
    }

    /// Any non-zero byte is true
    pub fn decode_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    decode_le! {
        decode_u8 => u8,
        decode_u16 => u16,
        decode_u32 => u32,
        decode_u64 => u64,
        decode_i8 => i8,
        decode_i16 => i16,
        decode_i32 => i32,
        decode_i64 => i64,
        decode_f32 => f32,
        decode_f64 => f64,
    }
}
