//! Bulk append context
//!
//! Buffers rows and writes them to a container one bucket at a time.

use crate::error::{Result, TableError};
use crate::row::Row;

use super::Container;

pub const BUCKET_10: usize = 10;
pub const BUCKET_100: usize = 100;
pub const BUCKET_1K: usize = 1_000;
pub const BUCKET_10K: usize = 10_000;
pub const BUCKET_100K: usize = 100_000;
pub const BUCKET_1M: usize = 1_000_000;
pub const BUCKET_10M: usize = 10_000_000;

/// Collects rows and flushes them with one `bulk_append` per full bucket
///
/// The appender does not hold the container, so the target may change
/// between calls (e.g. after a rotation); buffered rows go to whichever
/// container receives the flush. Callers serialize access themselves.
pub struct BulkAppender<R: Row> {
    bucket: Vec<R>,
    capacity: usize,
    closed: bool,
}

impl<R: Row> BulkAppender<R> {
    /// Appender that flushes every `bucket_size` rows
    pub fn new(bucket_size: usize) -> Self {
        let capacity = bucket_size.max(1);
        Self {
            bucket: Vec::with_capacity(capacity),
            capacity,
            closed: false,
        }
    }

    /// Buffer a row; flushes to `container` when the bucket is full
    pub fn append(&mut self, container: &mut Container<R>, row: R) -> Result<()> {
        self.ensure_open()?;

        self.bucket.push(row);
        if self.bucket.len() >= self.capacity {
            self.flush(container)?;
        }
        Ok(())
    }

    /// Write buffered rows now
    pub fn flush(&mut self, container: &mut Container<R>) -> Result<()> {
        self.ensure_open()?;
        if self.bucket.is_empty() {
            return Ok(());
        }

        container.bulk_append(&self.bucket)?;
        self.bucket.clear();
        Ok(())
    }

    /// Flush the remainder and refuse further use
    pub fn close(&mut self, container: &mut Container<R>) -> Result<()> {
        self.flush(container)?;
        self.closed = true;
        Ok(())
    }

    /// Rows waiting for the next flush
    pub fn pending(&self) -> usize {
        self.bucket.len()
    }

    /// Whether `close` has completed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TableError::State("use of closed bulk appender".to_string()));
        }
        Ok(())
    }
}
