//! Row encoder

use crate::error::Result;

use super::{overrun, truncate_utf8};

/// Writes typed fields into a row buffer at an advancing cursor
pub struct Encoder<'a> {
    buffer: &'a mut [u8],
    pos: usize,
}

macro_rules! encode_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, v: $ty) -> Result<()> {
                self.put(&v.to_le_bytes())
            }
        )*
    };
}

impl<'a> Encoder<'a> {
    /// Start encoding at the beginning of `buffer`
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Reserve `width` bytes at the cursor and advance past them
    fn take(&mut self, width: usize) -> Result<&mut [u8]> {
        if width > self.remaining() {
            return Err(overrun("write", self.pos, width, self.buffer.len()));
        }
        let start = self.pos;
        self.pos += width;
        Ok(&mut self.buffer[start..start + width])
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.take(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write `s` into exactly `size` bytes, truncating or zero-padding
    ///
    /// Truncation never splits a UTF-8 character; the cut bytes become padding.
    pub fn encode_string_padded(&mut self, s: &str, size: usize) -> Result<()> {
        let bytes = truncate_utf8(s, size);
        let dst = self.take(size)?;
        dst[..bytes.len()].copy_from_slice(bytes);
        dst[bytes.len()..].fill(0);
        Ok(())
    }

    /// Write `b` into exactly `size` bytes, truncating or zero-padding
    pub fn encode_bytes_padded(&mut self, b: &[u8], size: usize) -> Result<()> {
        let n = b.len().min(size);
        let dst = self.take(size)?;
        dst[..n].copy_from_slice(&b[..n]);
        dst[n..].fill(0);
        Ok(())
    }

    /// One byte, 1 for true
    pub fn encode_bool(&mut self, v: bool) -> Result<()> {
        self.put(&[v as u8])
    }

    encode_le! {
        encode_u8 => u8,
        encode_u16 => u16,
        encode_u32 => u32,
        encode_u64 => u64,
        encode_i8 => i8,
        encode_i16 => i16,
        encode_i32 => i32,
        encode_i64 => i64,
        encode_f32 => f32,
        encode_f64 => f64,
    }
}
