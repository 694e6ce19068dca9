//! Schema-driven container access
//!
//! Reads any container without a compile-time row type by decoding each
//! column from its stored type and width. Used by tooling.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::codec::Decoder;
use crate::error::{Result, TableError};
use crate::schema::{Column, ColumnType, RowSpec};

use super::io::read_exact_at;
use super::Header;

/// One decoded cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bin(Vec<u8>),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Bin(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Read-only, untyped view of a container file
pub struct RawContainer {
    path: PathBuf,
    file: File,
    header: Header,
    num_rows: u64,
}

impl RawContainer {
    /// Open and validate a container without knowing its row type
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(TableError::io(format!("opening {}", path.display())))?;
        let file_len = file
            .metadata()
            .map_err(TableError::io(format!("reading metadata of {}", path.display())))?
            .len();

        let header = Header::read_from(&file, file_len)?;
        let num_rows = header.row_count(file_len)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            num_rows,
        })
    }

    /// Decode the row at `pos` column by column
    pub fn read_row(&self, pos: u64) -> Result<Vec<Value>> {
        if pos >= self.num_rows {
            return Err(TableError::Bounds {
                index: pos,
                count: 1,
                num_rows: self.num_rows,
            });
        }

        let row_size = self.header.spec.row_size();
        let mut buf = vec![0u8; row_size];
        read_exact_at(
            &self.file,
            &mut buf,
            self.header.content_offset() + pos * row_size as u64,
        )
        .map_err(TableError::io("reading row"))?;

        let mut dec = Decoder::new(&buf);
        self.header
            .spec
            .iter()
            .map(|column| decode_value(&mut dec, column))
            .collect()
    }

    /// Decode up to `count` rows from `start`, stopping at the end of the file
    pub fn read_rows(&self, start: u64, count: u64) -> Result<Vec<Vec<Value>>> {
        let end = start.saturating_add(count).min(self.num_rows);
        (start..end).map(|pos| self.read_row(pos)).collect()
    }

    /// Parsed header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Stored schema
    pub fn row_spec(&self) -> &RowSpec {
        &self.header.spec
    }

    /// Number of rows
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    /// Exact file size: header plus rows
    pub fn size(&self) -> u64 {
        self.header.content_offset() + self.num_rows * self.header.spec.row_size() as u64
    }

    /// Full path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn decode_value(dec: &mut Decoder<'_>, column: &Column) -> Result<Value> {
    let size = column.size as usize;
    Ok(match column.column_type {
        ColumnType::Str => Value::Str(dec.decode_string_padded(size)?),
        ColumnType::Bin => Value::Bin(dec.decode_bytes(size)?.to_vec()),
        ColumnType::Bool => Value::Bool(dec.decode_bool()?),
        ColumnType::I8 => Value::Int(dec.decode_i8()? as i64),
        ColumnType::I16 => Value::Int(dec.decode_i16()? as i64),
        ColumnType::I32 => Value::Int(dec.decode_i32()? as i64),
        ColumnType::I64 => Value::Int(dec.decode_i64()?),
        ColumnType::U8 => Value::UInt(dec.decode_u8()? as u64),
        ColumnType::U16 => Value::UInt(dec.decode_u16()? as u64),
        ColumnType::U32 => Value::UInt(dec.decode_u32()? as u64),
        ColumnType::U64 => Value::UInt(dec.decode_u64()?),
        ColumnType::F32 => Value::Float(dec.decode_f32()? as f64),
        ColumnType::F64 => Value::Float(dec.decode_f64()?),
    })
}
