//! MultiContainer
//!
//! ## Concurrency:
//! - `current`: parking_lot Mutex; writers, rotation and snapshot readers all
//!   go through it
//! - Rotation swaps in the new segment under the lock and finishes the old
//!   one (sync + enqueue) after releasing it
//! - Iterators run on their own thread and only borrow the lock to snapshot
//!   the live segment

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::archive::{ArchiveManager, SegmentCatalog, SegmentEntry, SegmentFile, SegmentForm, SegmentName, TimeRange};
use crate::config::{Config, OpenMode};
use crate::container::{bucket_rows, Container};
use crate::error::{Result, TableError};
use crate::iter::StreamIter;
use crate::row::Row;

use super::PeriodicTrigger;

/// Exclusive access to the live segment
pub type ContainerGuard<'a, R> = MappedMutexGuard<'a, Container<R>>;

/// Where a row came from during merged iteration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentRowKey {
    /// Canonical `.sbt` filename of the segment, whatever form it was read from
    pub filename: String,
    /// Row index inside that segment
    pub row: u64,
}

impl fmt::Display for SegmentRowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.filename, self.row)
    }
}

/// A rotating, archived table of `R` rows
pub struct MultiContainer<R: Row> {
    shared: Arc<Shared<R>>,
    trigger: Option<PeriodicTrigger>,
    closed: bool,
}

struct Shared<R: Row> {
    config: Config,
    catalog: SegmentCatalog,
    archive: ArchiveManager,

    /// None once closed
    current: Mutex<Option<Container<R>>>,

    /// Newest timestamp handed out; new segments must be strictly newer
    last_unix: AtomicI64,
}

impl<R: Row> MultiContainer<R> {
    /// Open (or create) the table described by `config`
    ///
    /// Starts the archive workers, which re-queue segments a previous run
    /// left uncompressed, then resumes or creates the live segment.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.root_dir)
            .map_err(TableError::io(format!("creating {}", config.root_dir.display())))?;

        let catalog = SegmentCatalog::new(&config.root_dir, &config.prefix)
            .with_scratch_dir(config.scratch_dir.clone());
        let last_unix = catalog.last_unix()?.unwrap_or(i64::MIN);
        let archive = ArchiveManager::start(
            catalog.clone(),
            config.compression_workers,
            config.compression_queue_capacity,
        )?;

        let shared = Arc::new(Shared {
            config,
            catalog,
            archive,
            current: Mutex::new(None),
            last_unix: AtomicI64::new(last_unix),
        });

        let container = shared.open_initial()?;
        info!(
            segment = %container.path().display(),
            rows = container.num_rows(),
            "Multi container opened"
        );
        *shared.current.lock() = Some(container);

        let trigger = match shared.config.rotation_interval {
            Some(interval) => {
                let task = Arc::clone(&shared);
                Some(PeriodicTrigger::spawn(
                    format!("sbt-rotate-{}", shared.config.prefix),
                    interval,
                    move || task.rotate().map(|_| ()),
                )?)
            }
            None => None,
        };

        Ok(Self {
            shared,
            trigger,
            closed: false,
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Lock the live segment
    ///
    /// Rotation waits while the guard is held, so keep it short.
    pub fn acquire(&self) -> Result<ContainerGuard<'_, R>> {
        MutexGuard::try_map(self.shared.current.lock(), |slot| slot.as_mut())
            .map_err(|_| TableError::State("multi container is closed".to_string()))
    }

    pub fn append(&self, row: &R) -> Result<()> {
        self.acquire()?.append(row)
    }

    pub fn bulk_append(&self, rows: &[R]) -> Result<()> {
        self.acquire()?.bulk_append(rows)
    }

    /// Retire the live segment and start a new one
    ///
    /// Returns false (and does nothing) when the live segment is empty.
    pub fn rotate(&self) -> Result<bool> {
        self.shared.rotate()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every row of every segment, oldest segment first
    pub fn iter(&self) -> Result<StreamIter<(SegmentRowKey, R)>> {
        self.iter_range(TimeRange::all())
    }

    /// Rows of segments whose timestamp falls in `range`
    ///
    /// The segment list is taken now. The live segment is read up to the row
    /// count it has when the iterator reaches it.
    pub fn iter_range(&self, range: TimeRange) -> Result<StreamIter<(SegmentRowKey, R)>> {
        let mut files = self.shared.catalog.files(&range)?;
        let shared = Arc::clone(&self.shared);
        let bucket_mb = shared.config.iter_bucket_mb;

        debug!(prefix = %shared.config.prefix, ?range, "Starting merged iteration");
        StreamIter::spawn(format!("sbt-multi-iter-{}", shared.config.prefix), move |sink| {
            for segment in files.by_ref() {
                if sink.is_cancelled() {
                    return Ok(());
                }

                let filename = segment.name().to_string();
                let (container, _fallback) = shared.open_segment(&segment).map_err(|e| {
                    warn!(segment = %filename, error = %e, "Iteration halted");
                    e
                })?;
                debug!(segment = %filename, rows = container.num_rows(), "Iterating segment");
                let batch = bucket_rows(bucket_mb, container.row_size());

                let mut more = true;
                container.scan(batch, |row, value| {
                    let key = SegmentRowKey {
                        filename: filename.clone(),
                        row,
                    };
                    more = sink.send((key, value));
                    more
                })?;
                container.close()?;

                if !more {
                    return Ok(());
                }
            }
            files.finish()
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Rows in the live segment
    pub fn num_rows(&self) -> Result<u64> {
        Ok(self.acquire()?.num_rows())
    }

    /// Path of the live segment
    pub fn current_path(&self) -> Result<PathBuf> {
        Ok(self.acquire()?.path().to_path_buf())
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn archive(&self) -> &ArchiveManager {
        &self.shared.archive
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Stop rotation, drain compression, then close the live segment
    ///
    /// Every step runs even if an earlier one failed; the first error is
    /// returned. The live segment stays uncompressed and is resumed by the
    /// next `AppendLatest` open.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first: Option<TableError> = None;

        if let Some(trigger) = self.trigger.take() {
            if let Err(e) = trigger.stop() {
                first.get_or_insert(e);
            }
        }
        if let Err(e) = self.shared.archive.close() {
            first.get_or_insert(e);
        }
        let current = self.shared.current.lock().take();
        if let Some(container) = current {
            if let Err(e) = container.close() {
                first.get_or_insert(e);
            }
        }

        debug!(prefix = %self.shared.config.prefix, "Multi container closed");
        first.map_or(Ok(()), Err)
    }
}

impl<R: Row> Drop for MultiContainer<R> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Multi container closed with errors");
        }
    }
}

// =============================================================================
// Shared State
// =============================================================================

impl<R: Row> Shared<R> {
    fn open_initial(&self) -> Result<Container<R>> {
        let latest = self.archive.last_uncompressed_filename()?;
        match (self.config.open_mode, latest) {
            (OpenMode::AppendLatest, Some(path)) => {
                debug!(segment = %path.display(), "Resuming latest segment");
                Container::open(path)
            }
            (OpenMode::CreateNew, Some(path)) => {
                if let Err(e) = self.archive.queue_compression(&path) {
                    warn!(segment = %path.display(), error = %e, "Could not queue previous segment");
                }
                self.create_segment()
            }
            (_, None) => self.create_segment(),
        }
    }

    fn rotate(&self) -> Result<bool> {
        let mut slot = self.current.lock();
        let Some(current) = slot.as_ref() else {
            return Ok(false);
        };
        if current.num_rows() == 0 {
            debug!(segment = %current.path().display(), "Skipping rotation of empty segment");
            return Ok(false);
        }

        let fresh = self.create_segment()?;
        let retired = slot.replace(fresh);
        drop(slot);

        let Some(retired) = retired else {
            return Ok(false);
        };
        let path = retired.path().to_path_buf();
        let rows = retired.num_rows();
        retired.close()?;

        if let Err(e) = self.archive.queue_compression(&path) {
            warn!(segment = %path.display(), error = %e, "Retired segment left uncompressed");
        }
        info!(segment = %path.display(), rows, "Segment rotated");
        Ok(true)
    }

    /// New segment stamped now, or one second after the newest one
    fn create_segment(&self) -> Result<Container<R>> {
        let now = Utc::now().timestamp();
        let previous = self
            .last_unix
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        let unix = now.max(previous.saturating_add(1));

        let name = SegmentName::at(self.catalog.prefix(), unix);
        Container::create(self.catalog.path_of(&name, SegmentForm::Uncompressed))
    }

    /// Open a segment handed out by the catalog for reading
    ///
    /// The second value owns a scratch copy when the segment had to be read
    /// from its archive after all; keep it alive while reading.
    fn open_segment(&self, segment: &SegmentFile) -> Result<(Container<R>, Option<SegmentFile>)> {
        if let Some(live) = self.live_reader(segment.name())? {
            return Ok((live, None));
        }

        match Container::open_read(segment.path()) {
            Err(TableError::IoContext { source, .. })
                if source.kind() == io::ErrorKind::NotFound
                    && segment.form() == SegmentForm::Uncompressed =>
            {
                // Archived between listing and opening
                let entry = SegmentEntry {
                    name: segment.name().clone(),
                    form: SegmentForm::Compressed,
                    path: self.catalog.path_of(segment.name(), SegmentForm::Compressed),
                };
                let scratch = self.catalog.materialize(&entry)?;
                let container = Container::open_read(scratch.path())?;
                Ok((container, Some(scratch)))
            }
            other => other.map(|container| (container, None)),
        }
    }

    /// Snapshot of the live segment if it is the one named
    fn live_reader(&self, name: &SegmentName) -> Result<Option<Container<R>>> {
        let slot = self.current.lock();
        match slot.as_ref() {
            Some(current) if current.filename() == name.to_string() => current.reader().map(Some),
            _ => Ok(None),
        }
    }
}
