//! Codec Module
//!
//! Sequential-cursor writers/readers used by `Row` implementations.
//!
//! ## Rules
//! - Every call writes/reads exactly its declared width and advances the cursor
//! - Integers and floats are little-endian
//! - Strings and byte blobs are truncated or zero-padded to their column width
//! - Running past the end of the row buffer is an error, not a panic
//!
//! A row must call the codec in the same order and with the same widths as
//! the columns it declares.

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::error::TableError;

/// Error for a cursor that would run past the row buffer
pub(crate) fn overrun(op: &str, pos: usize, width: usize, len: usize) -> TableError {
    TableError::Schema(format!(
        "{} of {} bytes at offset {} overruns {}-byte row",
        op, width, pos, len
    ))
}

/// Largest prefix of `s` that fits in `max` bytes without splitting a character
pub(crate) fn truncate_utf8(s: &str, max: usize) -> &[u8] {
    if s.len() <= max {
        return s.as_bytes();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}
