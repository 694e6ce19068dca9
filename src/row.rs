//! Row capability
//!
//! A row type declares its schema once (`columns`) and encodes/decodes
//! itself field by field. Dispatch is static: `Container<R>` is generic over
//! the row type, so a container can only ever hold one kind of row.
//!
//! ```
//! use serialtable::{ColumnType, Decoder, Encoder, Result, Row, RowSpec};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Tick {
//!     symbol: String,
//!     price: u32,
//! }
//!
//! impl Row for Tick {
//!     fn columns() -> RowSpec {
//!         RowSpec::new([
//!             ColumnType::Str.column_sized("symbol", 8),
//!             ColumnType::U32.column("price"),
//!         ])
//!     }
//!
//!     fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
//!         enc.encode_string_padded(&self.symbol, 8)?;
//!         enc.encode_u32(self.price)
//!     }
//!
//!     fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
//!         self.symbol = dec.decode_string_padded(8)?;
//!         self.price = dec.decode_u32()?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::codec::{Decoder, Encoder};
use crate::error::{Result, TableError};
use crate::schema::RowSpec;

/// A fixed-width record that can live in a container
///
/// `Default` is the factory: containers build zero values and decode into them.
pub trait Row: Default + Send + 'static {
    /// Column layout, in encode order
    fn columns() -> RowSpec;

    /// Write every column, in order, through the encoder
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()>;

    /// Read every column, in order, from the decoder
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()>;
}

/// Encode `row` into `buf`, which must be exactly one row wide
pub(crate) fn encode_exact<R: Row>(row: &R, buf: &mut [u8]) -> Result<()> {
    let len = buf.len();
    let mut enc = Encoder::new(buf);
    row.encode(&mut enc)?;
    if enc.position() != len {
        return Err(TableError::Schema(format!(
            "row encoded {} bytes but its columns declare {}",
            enc.position(),
            len
        )));
    }
    Ok(())
}

/// Decode `row` from `buf`, which must be exactly one row wide
pub(crate) fn decode_exact<R: Row>(row: &mut R, buf: &[u8]) -> Result<()> {
    let mut dec = Decoder::new(buf);
    row.decode(&mut dec)?;
    if dec.remaining() != 0 {
        return Err(TableError::Schema(format!(
            "row decoded {} bytes but its columns declare {}",
            dec.position(),
            buf.len()
        )));
    }
    Ok(())
}
