//! # SerialTable
//!
//! Append-mostly binary tables of fixed-width rows:
//! - One schema per file, validated by a hash on every open
//! - Constant-time random access by row index
//! - Time-based segment rotation with background gzip archiving
//! - Streaming, cancellable iteration across live and archived segments
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MultiContainer<R>                      │
//! │          (live segment + rotation + merged iteration)       │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!   ┌────────────────────────┐      ┌────────────────────────────┐
//!   │     Container<R>       │      │      ArchiveManager        │
//!   │ header + fixed rows    │      │ segment names, gzip pool,  │
//!   │ (positioned file I/O)  │      │ discovery, decompression   │
//!   └───────────┬────────────┘      └────────────────────────────┘
//!               │
//!               ▼
//!   ┌────────────────────────┐
//!   │  Row / Encoder / Decoder│
//!   │  RowSpec (JSON schema) │
//!   └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schema;
pub mod codec;
pub mod row;
pub mod buffer;
pub mod iter;
pub mod container;
pub mod archive;
pub mod multi;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TableError};
pub use config::{Config, ConfigBuilder, OpenMode};

pub use schema::{Column, ColumnType, RowSpec};
pub use codec::{Decoder, Encoder};
pub use row::Row;
pub use iter::{IterSink, StreamIter};
pub use container::{BulkAppender, Container, RawContainer, Value};
pub use archive::{ArchiveManager, SegmentFile, SegmentName, TimeRange};
pub use multi::{MultiContainer, SegmentRowKey};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SerialTable
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
