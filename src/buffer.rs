//! Scratch buffer pool
//!
//! Fixed-size byte buffers are checked out for one encode/decode and handed
//! back automatically when the `PooledBuffer` guard drops.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Upper bound on idle buffers kept per pool
const MAX_IDLE: usize = 8;

/// Pool of equally sized scratch buffers
pub struct BufferPool {
    size: usize,
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Pool handing out buffers of exactly `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            size,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Buffer width
    pub fn buffer_size(&self) -> usize {
        self.size
    }

    /// Take a buffer; it returns to the pool when the guard drops
    ///
    /// Contents are whatever the previous user left behind.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.size]);
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    /// Number of idle buffers (for testing/debugging)
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn give_back(&self, buf: Vec<u8>) {
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        }
    }
}

/// A checked-out buffer
pub struct PooledBuffer<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.give_back(buf);
        }
    }
}
