//! Archive Manager
//!
//! Background compression of retired segments.
//!
//! ## Concurrency:
//! - `queue`: bounded crossbeam channel shared by every worker
//! - Workers keep going after a failed job and report the first failure
//!   from `close()`
//! - All methods use `&self`; `close` is idempotent

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TableError};
use crate::iter::StreamIter;

use super::gzip::gzip_file;
use super::{SegmentCatalog, SegmentEntry, SegmentFile, TimeRange};

/// Compresses retired segments and lists segments for readers
pub struct ArchiveManager {
    catalog: SegmentCatalog,

    /// None once closed
    queue: Mutex<Option<Sender<PathBuf>>>,

    /// Each worker returns the first error it hit
    workers: Mutex<Vec<JoinHandle<Option<TableError>>>>,
}

impl ArchiveManager {
    /// Start `workers` compression threads and re-queue leftovers
    ///
    /// On startup every uncompressed segment without an archive twin is
    /// queued, except the newest one, which may still be the live segment.
    pub fn start(catalog: SegmentCatalog, workers: usize, queue_capacity: usize) -> Result<Self> {
        if workers == 0 || queue_capacity == 0 {
            return Err(TableError::Config(
                "archive needs at least one worker and a non-empty queue".to_string(),
            ));
        }

        let (tx, rx) = channel::bounded(queue_capacity);
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("sbt-archive-{}-{}", catalog.prefix(), id))
                .spawn(move || worker_loop(id, rx))
                .map_err(TableError::io("spawning archive worker"))?;
            handles.push(handle);
        }

        let manager = Self {
            catalog,
            queue: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        };
        manager.reconcile()?;

        info!(
            dir = %manager.catalog.root_dir().display(),
            prefix = manager.catalog.prefix(),
            workers,
            "Archive manager started"
        );
        Ok(manager)
    }

    /// Queue a closed segment for compression without blocking
    ///
    /// Fails when the queue is full or the manager is closed; the file then
    /// stays uncompressed until the next startup picks it up.
    pub fn queue_compression(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let queue = self.queue.lock();
        let tx = queue
            .as_ref()
            .ok_or_else(|| TableError::State("archive manager is closed".to_string()))?;

        match tx.try_send(path) {
            Ok(()) => {
                debug!(queued = tx.len(), "Segment queued for compression");
                Ok(())
            }
            Err(TrySendError::Full(path)) => Err(TableError::State(format!(
                "compression queue full, {} left uncompressed",
                path.display()
            ))),
            Err(TrySendError::Disconnected(path)) => Err(TableError::Worker(format!(
                "archive workers gone, {} left uncompressed",
                path.display()
            ))),
        }
    }

    /// Jobs waiting in the queue (not counting those being compressed)
    pub fn pending(&self) -> usize {
        self.queue.lock().as_ref().map_or(0, |tx| tx.len())
    }

    /// Newest uncompressed segment, if any
    pub fn last_uncompressed_filename(&self) -> Result<Option<PathBuf>> {
        Ok(self.catalog.last_uncompressed()?.map(|e| e.path))
    }

    /// One entry per segment in `range`, oldest first
    pub fn iterable_filenames(&self, range: &TimeRange) -> Result<Vec<SegmentEntry>> {
        self.catalog.iterable(range)
    }

    /// Stream readable files for every segment in `range`
    pub fn files(&self, range: &TimeRange) -> Result<StreamIter<SegmentFile>> {
        self.catalog.files(range)
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }

    /// Stop accepting work, drain the queue and join the workers
    ///
    /// Returns the first compression error any worker hit.
    pub fn close(&self) -> Result<()> {
        // Dropping the sender lets workers finish the backlog and exit
        let sender = self.queue.lock().take();
        if sender.is_none() {
            return Ok(());
        }
        drop(sender);

        let handles = std::mem::take(&mut *self.workers.lock());
        let mut first = None;
        for handle in handles {
            let result = handle
                .join()
                .unwrap_or_else(|_| Some(TableError::Worker("archive worker panicked".to_string())));
            if let Some(e) = result {
                first.get_or_insert(e);
            }
        }

        debug!(prefix = self.catalog.prefix(), "Archive manager closed");
        first.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Clean up after a previous run and queue its leftovers
    ///
    /// Runs before anything else is queued, so no worker is writing a partial.
    /// Blocks if the queue is full.
    fn reconcile(&self) -> Result<usize> {
        let swept = self.catalog.remove_partial_archives()?;
        if swept > 0 {
            info!(count = swept, "Removed partial archives from an interrupted run");
        }

        let mut leftovers = self.catalog.uncompressed()?;
        leftovers.pop();
        if leftovers.is_empty() {
            return Ok(0);
        }

        let queue = self.queue.lock();
        let Some(tx) = queue.as_ref() else {
            return Ok(0);
        };
        for entry in &leftovers {
            tx.send(entry.path.clone())
                .map_err(|_| TableError::Worker("archive workers gone".to_string()))?;
        }

        info!(count = leftovers.len(), "Queued leftover segments for compression");
        Ok(leftovers.len())
    }
}

impl Drop for ArchiveManager {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Archive manager closed with errors");
        }
    }
}

fn worker_loop(id: usize, rx: Receiver<PathBuf>) -> Option<TableError> {
    let mut first = None;
    for path in rx.iter() {
        debug!(worker = id, file = %path.display(), "Compressing segment");
        match compress_segment(&path) {
            Ok(archive) => info!(worker = id, archive = %archive.display(), "Segment compressed"),
            Err(e) => {
                error!(worker = id, file = %path.display(), error = %e, "Compression failed");
                first.get_or_insert(e);
            }
        }
    }
    first
}

/// gzip, then remove the original once the archive is durable
fn compress_segment(path: &Path) -> Result<PathBuf> {
    let archive = gzip_file(path)?;
    fs::remove_file(path).map_err(TableError::io(format!("removing {}", path.display())))?;
    Ok(archive)
}
