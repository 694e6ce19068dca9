//! Archive Module
//!
//! Owns the segment files of one table on disk: naming, discovery,
//! background gzip compression and transparent decompression for readers.
//!
//! ## Responsibilities
//! - Encode and parse segment filenames
//! - Discover segments and pick one representative file per segment
//! - Compress retired segments on a worker pool
//! - Re-queue segments left uncompressed by a previous run
//! - Stream segment files in timestamp order, decompressing archived ones
//!
//! ## Segment Files
//! ```text
//! {prefix}_{YYYY-MM-DD-HH-MM}_{unix}.sbt                 live or retired
//! {prefix}_{YYYY-MM-DD-HH-MM}_{unix}.sbt.gz              archived
//! {prefix}_{YYYY-MM-DD-HH-MM}_{unix}.sbt.decompressed    scratch copy
//!
//!                 rotate                 worker pool
//!   current.sbt ─────────▶ retired.sbt ─────────────▶ retired.sbt.gz
//!                           (queued)     gzip → .tmp → rename → rm .sbt
//! ```
//!
//! Several files may describe the same segment (a crash between writing the
//! archive and removing the original leaves both). Readers see each segment
//! once, through its preferred form: `.sbt`, then `.sbt.decompressed`, then
//! `.sbt.gz`.

mod catalog;
mod gzip;
mod manager;
mod name;

pub use catalog::{SegmentCatalog, SegmentEntry, SegmentFile, TimeRange};
pub use gzip::{decompressed_path, gunzip_file, gunzip_to_temp, gzip_file};
pub use manager::ArchiveManager;
pub use name::{SegmentForm, SegmentName, DATE_FORMAT};

/// Suffix appended to a container file once archived
pub const GZ_SUFFIX: &str = ".gz";

/// Suffix of a scratch copy produced by decompressing an archive in place
pub const DECOMPRESSED_SUFFIX: &str = ".decompressed";

/// Suffix of an archive still being written
pub const PARTIAL_SUFFIX: &str = ".tmp";
