//! Typed container
//!
//! Opens, creates and performs row I/O on a single container file.

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tracing::{debug, info};

use crate::buffer::BufferPool;
use crate::error::{Result, TableError};
use crate::iter::StreamIter;
use crate::row::{decode_exact, encode_exact, Row};
use crate::schema::RowSpec;

use super::io::{read_exact_at, write_all_at};
use super::{Header, DEFAULT_BUCKET_MB};

/// A single-file table of fixed-width rows of type `R`
///
/// ## Concurrency:
/// - Reads take `&self` and use positioned I/O; they can run from several
///   threads at once
/// - Writes take `&mut self`; one writer per file
/// - Iterators read through their own cloned handle and only see rows that
///   existed when the iterator was created
pub struct Container<R: Row> {
    /// Full path of the file
    path: PathBuf,
    /// Open handle (read-only or read-write)
    file: File,
    /// Validated header
    header: Header,
    /// Bytes per row
    row_size: usize,
    /// Offset of row 0
    content_offset: u64,
    /// Rows currently in the file
    num_rows: u64,
    /// Opened for writing
    writable: bool,
    /// Scratch buffers, one row wide
    pool: BufferPool,
    _row: PhantomData<fn() -> R>,
}

impl<R: Row> Container<R> {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create (or truncate) a container file for rows of type `R`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let header = Header::new(R::columns())?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(TableError::io(format!("creating {}", path.display())))?;

        write_all_at(&file, &header.to_bytes(), 0)
            .map_err(TableError::io(format!("writing header of {}", path.display())))?;

        info!(
            path = %path.display(),
            row_size = header.spec.row_size(),
            "Created container"
        );

        Ok(Self::from_parts(path, file, header, 0, true))
    }

    /// Open an existing container for reading and writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), true)
    }

    /// Open an existing container read-only
    pub fn open_read(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), false)
    }

    /// Open the file if it exists, create it otherwise
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn open_with(path: &Path, writable: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(TableError::io(format!("opening {}", path.display())))?;

        let file_len = file
            .metadata()
            .map_err(TableError::io(format!("reading metadata of {}", path.display())))?
            .len();

        let header = Header::read_from(&file, file_len)?;

        let declared = R::columns();
        if header.spec != declared {
            return Err(TableError::SchemaMismatch {
                stored: header.spec.to_string(),
                declared: declared.to_string(),
            });
        }

        let num_rows = header.row_count(file_len)?;

        debug!(
            path = %path.display(),
            num_rows,
            writable,
            "Opened container"
        );

        Ok(Self::from_parts(path, file, header, num_rows, writable))
    }

    fn from_parts(path: &Path, file: File, header: Header, num_rows: u64, writable: bool) -> Self {
        let row_size = header.spec.row_size();
        let content_offset = header.content_offset();
        Self {
            path: path.to_path_buf(),
            file,
            header,
            row_size,
            content_offset,
            num_rows,
            writable,
            pool: BufferPool::new(row_size),
            _row: PhantomData,
        }
    }

    /// Close the file
    ///
    /// Writable containers flush their data to disk first so that a closed
    /// segment is complete before it is handed off (e.g. for compression).
    pub fn close(self) -> Result<()> {
        if self.writable {
            self.file
                .sync_all()
                .map_err(TableError::io(format!("syncing {}", self.path.display())))?;
        }
        debug!(path = %self.path.display(), num_rows = self.num_rows, "Closed container");
        Ok(())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Append one row at the end of the file
    pub fn append(&mut self, row: &R) -> Result<()> {
        self.ensure_writable()?;

        let mut buf = self.pool.checkout();
        encode_exact(row, &mut buf)?;
        write_all_at(&self.file, &buf, self.row_offset(self.num_rows))
            .map_err(TableError::io("appending row"))?;
        drop(buf);

        self.num_rows += 1;
        Ok(())
    }

    /// Append many rows with a single write
    pub fn bulk_append(&mut self, rows: &[R]) -> Result<()> {
        self.ensure_writable()?;
        if rows.is_empty() {
            return Ok(());
        }

        let buf = self.encode_rows(rows)?;
        write_all_at(&self.file, &buf, self.row_offset(self.num_rows))
            .map_err(TableError::io("appending rows"))?;

        self.num_rows += rows.len() as u64;
        Ok(())
    }

    /// Overwrite the row at `index`
    pub fn set(&mut self, row: &R, index: u64) -> Result<()> {
        self.ensure_writable()?;
        self.check_bounds(index, 1)?;

        let mut buf = self.pool.checkout();
        encode_exact(row, &mut buf)?;
        write_all_at(&self.file, &buf, self.row_offset(index))
            .map_err(TableError::io("writing row"))?;
        Ok(())
    }

    /// Overwrite `rows.len()` consecutive rows starting at `index`
    pub fn bulk_set(&mut self, index: u64, rows: &[R]) -> Result<()> {
        self.ensure_writable()?;
        self.check_bounds(index, rows.len() as u64)?;
        if rows.is_empty() {
            return Ok(());
        }

        let buf = self.encode_rows(rows)?;
        write_all_at(&self.file, &buf, self.row_offset(index))
            .map_err(TableError::io("writing rows"))?;
        Ok(())
    }

    fn encode_rows(&self, rows: &[R]) -> Result<BytesMut> {
        let mut buf = BytesMut::zeroed(rows.len() * self.row_size);
        for (row, chunk) in rows.iter().zip(buf.chunks_exact_mut(self.row_size)) {
            encode_exact(row, chunk)?;
        }
        Ok(buf)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Decode the row at `pos` into `row`
    pub fn read_at(&self, pos: u64, row: &mut R) -> Result<()> {
        self.check_bounds(pos, 1)?;

        let mut buf = self.pool.checkout();
        read_exact_at(&self.file, &mut buf, self.row_offset(pos))
            .map_err(TableError::io("reading row"))?;
        decode_exact(row, &buf)
    }

    /// Read the row at `pos` into a fresh value
    pub fn get(&self, pos: u64) -> Result<R> {
        let mut row = R::default();
        self.read_at(pos, &mut row)?;
        Ok(row)
    }

    /// Decode consecutive rows starting at `pos` into the given slots
    ///
    /// Reads are clamped to the rows the file actually holds, so asking for
    /// more than remain fills a prefix of `rows`. Returns the number of slots
    /// filled. Only a start position past the end is an error.
    pub fn bulk_read(&self, pos: u64, rows: &mut [R]) -> Result<usize> {
        if pos > self.num_rows {
            return Err(TableError::Bounds {
                index: pos,
                count: 0,
                num_rows: self.num_rows,
            });
        }

        let available = (self.num_rows - pos).min(rows.len() as u64) as usize;
        if available == 0 {
            return Ok(0);
        }

        let mut buf = vec![0u8; available * self.row_size];
        read_exact_at(&self.file, &mut buf, self.row_offset(pos))
            .map_err(TableError::io("reading rows"))?;

        for (row, chunk) in rows.iter_mut().zip(buf.chunks_exact(self.row_size)) {
            decode_exact(row, chunk)?;
        }

        Ok(available)
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Stream every row as `(index, row)` using the default batch budget
    pub fn iter(&self) -> Result<StreamIter<(u64, R)>> {
        self.iter_bucket_size(DEFAULT_BUCKET_MB)
    }

    /// Stream every row, reading batches of about `size_mb` megabytes
    pub fn iter_bucket_size(&self, size_mb: usize) -> Result<StreamIter<(u64, R)>> {
        let reader = self.reader()?;
        let bucket_rows = bucket_rows(size_mb, self.row_size);
        let name = format!("sbt-iter-{}", self.filename());

        StreamIter::spawn(name, move |sink| {
            reader.scan(bucket_rows, |index, row| sink.send((index, row)))
        })
    }

    /// Visit rows in order, `bucket_rows` per read, until `visit` returns false
    pub(crate) fn scan<F>(&self, bucket_rows: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(u64, R) -> bool,
    {
        let total = self.num_rows;
        let batch = (bucket_rows as u64).clamp(1, total.max(1)) as usize;
        let mut slots: Vec<R> = (0..batch).map(|_| R::default()).collect();

        let mut pos = 0u64;
        while pos < total {
            let n = self.bulk_read(pos, &mut slots)?;
            if n == 0 {
                break;
            }
            for (i, slot) in slots[..n].iter_mut().enumerate() {
                if !visit(pos + i as u64, std::mem::take(slot)) {
                    return Ok(());
                }
            }
            pos += n as u64;
        }

        Ok(())
    }

    /// Read-only view over a cloned handle, frozen at the current row count
    pub(crate) fn reader(&self) -> Result<Container<R>> {
        let file = self
            .file
            .try_clone()
            .map_err(TableError::io(format!("cloning handle of {}", self.path.display())))?;
        Ok(Self {
            path: self.path.clone(),
            file,
            header: self.header.clone(),
            row_size: self.row_size,
            content_offset: self.content_offset,
            num_rows: self.num_rows,
            writable: false,
            pool: BufferPool::new(self.row_size),
            _row: PhantomData,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of rows
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    /// Exact file size: header plus rows
    pub fn size(&self) -> u64 {
        self.content_offset + self.num_rows * self.row_size as u64
    }

    /// Bytes per row
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Stored schema
    pub fn row_spec(&self) -> &RowSpec {
        &self.header.spec
    }

    /// Parsed header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// FNV-1a hash of the stored schema
    pub fn header_hash(&self) -> u64 {
        self.header.hash
    }

    /// Flags/version byte
    pub fn version(&self) -> u8 {
        self.header.flags
    }

    /// Offset of row 0
    pub fn content_offset(&self) -> u64 {
        self.content_offset
    }

    /// Full path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Opened for writing
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn row_offset(&self, index: u64) -> u64 {
        self.content_offset + index * self.row_size as u64
    }

    fn check_bounds(&self, index: u64, count: u64) -> Result<()> {
        match index.checked_add(count) {
            Some(end) if end <= self.num_rows => Ok(()),
            _ => Err(TableError::Bounds {
                index,
                count,
                num_rows: self.num_rows,
            }),
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(TableError::State(format!(
                "{} was opened read-only",
                self.path.display()
            )))
        }
    }
}

/// Rows per batch for a byte budget of `size_mb` megabytes (at least one)
pub(crate) fn bucket_rows(size_mb: usize, row_size: usize) -> usize {
    (size_mb.saturating_mul(1024 * 1024) / row_size.max(1)).max(1)
}
