//! Column definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};

/// Storage type of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bin")]
    Bin,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "i8")]
    I8,
    #[serde(rename = "i16")]
    I16,
    #[serde(rename = "i32")]
    I32,
    #[serde(rename = "i64")]
    I64,
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "u16")]
    U16,
    #[serde(rename = "u32")]
    U32,
    #[serde(rename = "u64")]
    U64,
    #[serde(rename = "f32")]
    F32,
    #[serde(rename = "f64")]
    F64,
}

impl ColumnType {
    /// All column types, in declaration order
    pub const ALL: [ColumnType; 13] = [
        ColumnType::Str,
        ColumnType::Bin,
        ColumnType::Bool,
        ColumnType::I8,
        ColumnType::I16,
        ColumnType::I32,
        ColumnType::I64,
        ColumnType::U8,
        ColumnType::U16,
        ColumnType::U32,
        ColumnType::U64,
        ColumnType::F32,
        ColumnType::F64,
    ];

    /// Width used when a column is declared without an explicit size
    pub const fn default_size(self) -> u8 {
        match self {
            ColumnType::Str => 8,
            ColumnType::Bin => 64,
            ColumnType::Bool | ColumnType::I8 | ColumnType::U8 => 1,
            ColumnType::I16 | ColumnType::U16 => 2,
            ColumnType::I32 | ColumnType::U32 | ColumnType::F32 => 4,
            ColumnType::I64 | ColumnType::U64 | ColumnType::F64 => 8,
        }
    }

    /// Short tag as stored in the header ("str", "u32", ...)
    pub const fn as_str(self) -> &'static str {
        match self {
            ColumnType::Str => "str",
            ColumnType::Bin => "bin",
            ColumnType::Bool => "bool",
            ColumnType::I8 => "i8",
            ColumnType::I16 => "i16",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::U8 => "u8",
            ColumnType::U16 => "u16",
            ColumnType::U32 => "u32",
            ColumnType::U64 => "u64",
            ColumnType::F32 => "f32",
            ColumnType::F64 => "f64",
        }
    }

    /// Variable-width types (str, bin) accept any size; the rest must match exactly
    pub const fn is_fixed(self) -> bool {
        !matches!(self, ColumnType::Str | ColumnType::Bin)
    }

    /// Column of this type with the default width
    pub fn column(self, name: impl Into<String>) -> Column {
        Column::new(name, self)
    }

    /// Column of this type with an explicit width
    pub fn column_sized(self, name: impl Into<String>, size: u8) -> Column {
        Column::with_size(name, self, size)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        ColumnType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TableError::Schema(format!("unknown column type {:?}", s)))
    }
}

/// A named, fixed-width column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub size: u8,
}

impl Column {
    /// Create a column with the type's default width
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::with_size(name, column_type, column_type.default_size())
    }

    /// Create a column with an explicit width
    pub fn with_size(name: impl Into<String>, column_type: ColumnType, size: u8) -> Self {
        Self {
            name: name.into(),
            column_type,
            size,
        }
    }

    /// Check the declared width against the type
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(TableError::Schema(format!(
                "column {:?} has zero width",
                self.name
            )));
        }
        if self.column_type.is_fixed() && self.size != self.column_type.default_size() {
            return Err(TableError::Schema(format!(
                "column {:?} of type {} must be {} bytes wide, got {}",
                self.name,
                self.column_type,
                self.column_type.default_size(),
                self.size
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}.{})", self.name, self.column_type, self.size)
    }
}
