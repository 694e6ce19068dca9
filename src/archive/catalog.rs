//! Segment discovery
//!
//! A `SegmentCatalog` is a cheap, cloneable view of one table's directory.
//! Every call rescans the directory, so it never goes stale while the archive
//! workers rename files underneath it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempPath;
use tracing::{debug, trace};

use crate::error::{Result, TableError};
use crate::iter::StreamIter;

use super::gzip::gunzip_to_temp;
use super::{SegmentForm, SegmentName, PARTIAL_SUFFIX};

/// Half-open time window `[start, end)` over segment timestamps
///
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Every segment
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Segments stamped at or after `start`
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Segments stamped strictly before `end`
    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts < e)
    }
}

/// One file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub name: SegmentName,
    pub form: SegmentForm,
    pub path: PathBuf,
}

/// A readable, uncompressed segment file handed to a consumer
///
/// For archived segments the path points at a scratch copy that is deleted
/// when this value is dropped.
#[derive(Debug)]
pub struct SegmentFile {
    name: SegmentName,
    form: SegmentForm,
    path: PathBuf,
    scratch: Option<TempPath>,
}

impl SegmentFile {
    /// Segment identity (its `Display` is the canonical `.sbt` filename)
    pub fn name(&self) -> &SegmentName {
        &self.name
    }

    /// Form the segment was found in
    pub fn form(&self) -> SegmentForm {
        self.form
    }

    /// Path of a readable uncompressed copy
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when `path` is a scratch copy owned by this value
    pub fn is_scratch(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Directory + prefix of one table
#[derive(Debug, Clone)]
pub struct SegmentCatalog {
    root_dir: PathBuf,
    prefix: String,
    scratch_dir: Option<PathBuf>,
}

impl SegmentCatalog {
    pub fn new(root_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            prefix: prefix.into(),
            scratch_dir: None,
        }
    }

    /// Decompress archived segments into `dir` instead of the system temp dir
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of a segment in the given form
    pub fn path_of(&self, name: &SegmentName, form: SegmentForm) -> PathBuf {
        self.root_dir.join(name.filename(form))
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Every file belonging to this table, in no particular order
    ///
    /// Files that do not parse as segment names, or carry another prefix, are
    /// ignored.
    pub fn scan(&self) -> Result<Vec<SegmentEntry>> {
        let dir = fs::read_dir(&self.root_dir)
            .map_err(TableError::io(format!("listing {}", self.root_dir.display())))?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(TableError::io(format!("listing {}", self.root_dir.display())))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !filename.starts_with(&self.prefix) {
                continue;
            }

            match SegmentName::parse(filename) {
                Ok((name, form)) if name.prefix() == self.prefix => {
                    entries.push(SegmentEntry { name, form, path });
                }
                Ok(_) => {}
                Err(e) => trace!(file = %filename, error = %e, "Skipping unrecognised file"),
            }
        }

        Ok(entries)
    }

    /// Delete `.gz.tmp` files a crashed compression left behind
    ///
    /// Only partials of this table's segments are touched. Must not run while
    /// a compression of this table is in flight.
    pub fn remove_partial_archives(&self) -> Result<usize> {
        let dir = fs::read_dir(&self.root_dir)
            .map_err(TableError::io(format!("listing {}", self.root_dir.display())))?;

        let mut removed = 0;
        for entry in dir {
            let entry = entry.map_err(TableError::io(format!("listing {}", self.root_dir.display())))?;
            let path = entry.path();
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(archive) = filename.strip_suffix(PARTIAL_SUFFIX) else {
                continue;
            };
            match SegmentName::parse(archive) {
                Ok((name, SegmentForm::Compressed)) if name.prefix() == self.prefix => {
                    fs::remove_file(&path).map_err(TableError::io(format!("removing {}", path.display())))?;
                    debug!(file = %filename, "Removed partial archive");
                    removed += 1;
                }
                _ => {}
            }
        }

        Ok(removed)
    }

    /// One entry per segment inside `range`, oldest first
    ///
    /// When a segment exists in several forms the cheapest to read wins:
    /// `.sbt`, then `.sbt.decompressed`, then `.sbt.gz`.
    pub fn iterable(&self, range: &TimeRange) -> Result<Vec<SegmentEntry>> {
        let mut best: BTreeMap<SegmentName, SegmentEntry> = BTreeMap::new();
        for entry in self.scan()? {
            if !range.contains(entry.name.timestamp()) {
                continue;
            }
            match best.get(&entry.name) {
                Some(existing) if existing.form <= entry.form => {}
                _ => {
                    best.insert(entry.name.clone(), entry);
                }
            }
        }
        Ok(best.into_values().collect())
    }

    /// Uncompressed segments with no archive twin, oldest first
    pub fn uncompressed(&self) -> Result<Vec<SegmentEntry>> {
        let entries = self.scan()?;
        let mut pending: Vec<SegmentEntry> = entries
            .iter()
            .filter(|e| e.form == SegmentForm::Uncompressed)
            .filter(|e| {
                !entries
                    .iter()
                    .any(|other| other.name == e.name && other.form == SegmentForm::Compressed)
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pending)
    }

    /// Newest uncompressed segment, if any
    pub fn last_uncompressed(&self) -> Result<Option<SegmentEntry>> {
        Ok(self.uncompressed()?.pop())
    }

    /// Largest unix timestamp used by any segment of this table
    pub fn last_unix(&self) -> Result<Option<i64>> {
        Ok(self.scan()?.iter().map(|e| e.name.unix()).max())
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    /// Turn an entry into a readable uncompressed file
    ///
    /// Archived segments are decompressed into a scratch file. An uncompressed
    /// entry that vanished since it was listed (archived in the meantime) is
    /// read from its archive instead.
    pub fn materialize(&self, entry: &SegmentEntry) -> Result<SegmentFile> {
        let archive = match entry.form {
            SegmentForm::Compressed => entry.path.clone(),
            _ if entry.path.exists() => {
                return Ok(SegmentFile {
                    name: entry.name.clone(),
                    form: entry.form,
                    path: entry.path.clone(),
                    scratch: None,
                });
            }
            _ => self.path_of(&entry.name, SegmentForm::Compressed),
        };

        debug!(archive = %archive.display(), "Decompressing segment for reading");
        let scratch = gunzip_to_temp(&archive, self.scratch_dir.as_deref())?;
        Ok(SegmentFile {
            name: entry.name.clone(),
            form: entry.form,
            path: scratch.to_path_buf(),
            scratch: Some(scratch),
        })
    }

    /// Stream readable files for every segment in `range`, oldest first
    ///
    /// The listing happens now; decompression happens lazily on the producer
    /// thread, one segment ahead of the consumer at most.
    pub fn files(&self, range: &TimeRange) -> Result<StreamIter<SegmentFile>> {
        let entries = self.iterable(range)?;
        if entries.is_empty() {
            return Ok(StreamIter::empty());
        }

        let catalog = self.clone();
        StreamIter::spawn(format!("sbt-files-{}", self.prefix), move |sink| {
            for entry in &entries {
                if sink.is_cancelled() {
                    break;
                }
                let file = catalog.materialize(entry)?;
                if !sink.send(file) {
                    break;
                }
            }
            Ok(())
        })
    }
}
