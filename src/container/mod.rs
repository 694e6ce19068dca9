//! Container Module
//!
//! A single binary file holding one schema and its fixed-width rows.
//!
//! ## Responsibilities
//! - Write and validate the header (magic, version, schema hash)
//! - Derive the row count from the file size
//! - Bounds-checked random and bulk row I/O
//! - Batched streaming iteration
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Preamble (15 bytes, little-endian)                           │
//! │   Magic: 0x5B70 (2) | Version (1) | FNV-1a 64 hash (8) |     │
//! │   Schema length (4)                                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Schema (schema length bytes)                                 │
//! │   JSON: [{"name":"symbol","type":"str","size":8}, ...]       │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Rows (N × RowSize)                                           │
//! │   row 0 | row 1 | ... | row N-1   (no separators, no footer) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The hash covers the schema bytes only. There is no row count on disk:
//! `N = (file size - content offset) / RowSize`, and a file whose row area is
//! not a whole number of rows is rejected.

mod bulk;
mod table;
mod header;
mod io;
mod print;
mod raw;

pub use bulk::{
    BulkAppender, BUCKET_10, BUCKET_100, BUCKET_100K, BUCKET_10K, BUCKET_10M, BUCKET_1K,
    BUCKET_1M,
};
pub use table::Container;
pub(crate) use table::bucket_rows;
pub use header::{fnv1a64, Header};
pub use raw::{RawContainer, Value};

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic number identifying a container file
pub const MAGIC: u16 = 0x5B70;

/// Current flags/version byte
pub const VERSION: u8 = 0;

/// Preamble size: Magic (2) + Version (1) + Hash (8) + Schema length (4)
pub const PREAMBLE_SIZE: u64 = 15;

/// Default byte budget of one iteration batch, in MB
pub const DEFAULT_BUCKET_MB: usize = 10;

/// File extension of an uncompressed container
pub const EXTENSION: &str = "sbt";
