//! RowSpec: ordered column list

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};

use super::Column;

/// Ordered sequence of columns; order defines on-disk field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSpec(Vec<Column>);

impl RowSpec {
    /// Create a spec from columns, in order
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self(columns.into_iter().collect())
    }

    /// Builder-style column append
    pub fn column(mut self, column: Column) -> Self {
        self.0.push(column);
        self
    }

    /// Sum of all column widths
    pub fn row_size(&self) -> usize {
        self.0.iter().map(|c| c.size as usize).sum()
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.0
    }

    /// Byte offset of each column within a row
    pub fn offsets(&self) -> Vec<usize> {
        self.0
            .iter()
            .scan(0usize, |offset, c| {
                let start = *offset;
                *offset += c.size as usize;
                Some(start)
            })
            .collect()
    }

    /// Reject empty specs, zero-width columns and bad fixed widths
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(TableError::Schema("row spec has no columns".to_string()));
        }
        for column in &self.0 {
            column.validate()?;
        }
        if self.row_size() > u32::MAX as usize {
            return Err(TableError::Schema(format!(
                "row size {} too large",
                self.row_size()
            )));
        }
        Ok(())
    }

    /// Serialize to the header representation (JSON array)
    pub fn to_header_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the header representation
    pub fn from_header_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| TableError::Format(format!("failed to decode schema header: {}", e)))
    }
}

impl Deref for RowSpec {
    type Target = [Column];

    fn deref(&self) -> &[Column] {
        &self.0
    }
}

impl FromIterator<Column> for RowSpec {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for RowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", column)?;
        }
        f.write_str("]")
    }
}
