//! Container header
//!
//! Encodes and validates the preamble plus serialized schema.

use std::fs::File;

use crate::error::{Result, TableError};
use crate::schema::RowSpec;

use super::io::read_exact_at;
use super::{MAGIC, PREAMBLE_SIZE, VERSION};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a, 64-bit
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Parsed container header
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Flags/version byte
    pub flags: u8,
    /// FNV-1a 64 of `schema_bytes`
    pub hash: u64,
    /// Decoded schema
    pub spec: RowSpec,
    /// Schema exactly as stored
    pub schema_bytes: Vec<u8>,
}

impl Header {
    /// Build the header for a new container
    pub fn new(spec: RowSpec) -> Result<Self> {
        spec.validate()?;
        let schema_bytes = spec.to_header_bytes()?;
        if schema_bytes.len() > u32::MAX as usize {
            return Err(TableError::Schema("schema header too large".to_string()));
        }
        Ok(Self {
            flags: VERSION,
            hash: fnv1a64(&schema_bytes),
            spec,
            schema_bytes,
        })
    }

    /// Offset of row 0
    pub fn content_offset(&self) -> u64 {
        PREAMBLE_SIZE + self.schema_bytes.len() as u64
    }

    /// Serialized preamble + schema
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.content_offset() as usize);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.push(self.flags);
        out.extend_from_slice(&self.hash.to_le_bytes());
        out.extend_from_slice(&(self.schema_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.schema_bytes);
        out
    }

    /// Read and validate the header of an open file
    ///
    /// Nothing past the header is touched; any mismatch is a `Format` error.
    pub fn read_from(file: &File, file_len: u64) -> Result<Self> {
        if file_len < PREAMBLE_SIZE {
            return Err(TableError::Format(format!(
                "file is {} bytes, shorter than the {}-byte preamble",
                file_len, PREAMBLE_SIZE
            )));
        }

        let mut preamble = [0u8; PREAMBLE_SIZE as usize];
        read_exact_at(file, &mut preamble, 0).map_err(TableError::io("reading preamble"))?;

        let magic = u16::from_le_bytes([preamble[0], preamble[1]]);
        if magic != MAGIC {
            return Err(TableError::Format(format!(
                "invalid magic number: expected {:#06x}, got {:#06x}",
                MAGIC, magic
            )));
        }

        let flags = preamble[2];
        if flags != VERSION {
            return Err(TableError::Format(format!(
                "unsupported version: {}",
                flags
            )));
        }

        let mut hash_bytes = [0u8; 8];
        hash_bytes.copy_from_slice(&preamble[3..11]);
        let hash = u64::from_le_bytes(hash_bytes);

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&preamble[11..15]);
        let schema_len = u32::from_le_bytes(len_bytes) as u64;

        if schema_len > file_len - PREAMBLE_SIZE {
            return Err(TableError::Format(format!(
                "schema length {} exceeds file size {}",
                schema_len, file_len
            )));
        }

        let mut schema_bytes = vec![0u8; schema_len as usize];
        read_exact_at(file, &mut schema_bytes, PREAMBLE_SIZE)
            .map_err(TableError::io("reading schema"))?;

        let actual = fnv1a64(&schema_bytes);
        if actual != hash {
            return Err(TableError::Format(format!(
                "invalid header hash {:x} != {:x}",
                hash, actual
            )));
        }

        let spec = RowSpec::from_header_bytes(&schema_bytes)?;
        spec.validate()
            .map_err(|e| TableError::Format(format!("stored schema is invalid: {}", e)))?;

        Ok(Self {
            flags,
            hash,
            spec,
            schema_bytes,
        })
    }

    /// Row count implied by the file size
    pub fn row_count(&self, file_len: u64) -> Result<u64> {
        let row_size = self.spec.row_size() as u64;
        let content = file_len.saturating_sub(self.content_offset());
        if content % row_size != 0 {
            return Err(TableError::Format(format!(
                "partial trailing row: {} content bytes is not a multiple of row size {}",
                content, row_size
            )));
        }
        Ok(content / row_size)
    }
}
