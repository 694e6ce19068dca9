//! Segment filenames
//!
//! `{prefix}_{YYYY-MM-DD-HH-MM}_{unix}.{ext}`. The prefix may itself contain
//! underscores, so names are split from the right. The unix seconds are the
//! authoritative timestamp; the date part is informational and minute-precise.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::container::EXTENSION;
use crate::error::{Result, TableError};

use super::{DECOMPRESSED_SUFFIX, GZ_SUFFIX};

/// chrono format of the date part
pub const DATE_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Which on-disk representation a file is
///
/// Ordered by read preference: cheapest to read first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentForm {
    /// `.sbt`
    Uncompressed,
    /// `.sbt.decompressed`
    Decompressed,
    /// `.sbt.gz`
    Compressed,
}

impl SegmentForm {
    /// Full extension including the container extension, without a leading dot
    pub fn extension(&self) -> String {
        match self {
            SegmentForm::Uncompressed => EXTENSION.to_string(),
            SegmentForm::Decompressed => format!("{}{}", EXTENSION, DECOMPRESSED_SUFFIX),
            SegmentForm::Compressed => format!("{}{}", EXTENSION, GZ_SUFFIX),
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        let rest = ext.strip_prefix(EXTENSION)?;
        match rest {
            "" => Some(SegmentForm::Uncompressed),
            DECOMPRESSED_SUFFIX => Some(SegmentForm::Decompressed),
            GZ_SUFFIX => Some(SegmentForm::Compressed),
            _ => None,
        }
    }
}

/// Identity of one segment, independent of its form on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentName {
    prefix: String,
    unix: i64,
}

impl SegmentName {
    /// A name stamped with the current time
    pub fn now(prefix: impl Into<String>) -> Self {
        Self::at(prefix, Utc::now().timestamp())
    }

    /// A name stamped with `unix` seconds
    pub fn at(prefix: impl Into<String>, unix: i64) -> Self {
        Self {
            prefix: prefix.into(),
            unix,
        }
    }

    /// Parse a bare filename (or the last component of a path)
    ///
    /// Returns the segment identity and which form the file is in.
    pub fn parse(filename: &str) -> Result<(Self, SegmentForm)> {
        let base = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TableError::filename(filename, "no file name"))?;

        let (stem, ext) = base
            .split_once('.')
            .ok_or_else(|| TableError::filename(base, "missing extension"))?;
        let form = SegmentForm::from_extension(ext)
            .ok_or_else(|| TableError::filename(base, format!("unknown extension .{}", ext)))?;

        let mut parts = stem.rsplitn(3, '_');
        let (unix, date, prefix) = match (parts.next(), parts.next(), parts.next()) {
            (Some(unix), Some(date), Some(prefix)) if !prefix.is_empty() => (unix, date, prefix),
            _ => {
                return Err(TableError::filename(
                    base,
                    "expected {prefix}_{date}_{unix}",
                ))
            }
        };

        let unix: i64 = unix
            .parse()
            .map_err(|_| TableError::filename(base, format!("bad unix seconds {:?}", unix)))?;
        NaiveDateTime::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| TableError::filename(base, format!("bad date {:?}: {}", date, e)))?;

        Ok((Self::at(prefix, unix), form))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Authoritative timestamp in unix seconds
    pub fn unix(&self) -> i64 {
        self.unix
    }

    /// Timestamp as a UTC date
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.unix, 0)
            .single()
            .unwrap_or_default()
    }

    /// Filename of this segment in the given form
    pub fn filename(&self, form: SegmentForm) -> String {
        format!(
            "{}_{}_{}.{}",
            self.prefix,
            self.timestamp().format(DATE_FORMAT),
            self.unix,
            form.extension()
        )
    }
}

/// Canonical (uncompressed) filename
impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename(SegmentForm::Uncompressed))
    }
}

/// Chronological, then by prefix
impl Ord for SegmentName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unix
            .cmp(&other.unix)
            .then_with(|| self.prefix.cmp(&other.prefix))
    }
}

impl PartialOrd for SegmentName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
