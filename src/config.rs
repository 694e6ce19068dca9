//! Configuration for SerialTable
//!
//! Centralized configuration for a `MultiContainer` with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::container::DEFAULT_BUCKET_MB;
use crate::error::{Result, TableError};

/// Main configuration for a rotating, archived table
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every segment of this table
    /// Internal structure:
    ///   {root_dir}/
    ///     ├── {prefix}_2024-05-01-12-00_1714564800.sbt.gz   (archived)
    ///     ├── {prefix}_2024-05-01-13-00_1714568400.sbt.gz   (archived)
    ///     └── {prefix}_2024-05-01-14-00_1714572000.sbt      (current)
    pub root_dir: PathBuf,

    /// Segment filename prefix; may contain `_`, not `.` or path separators
    pub prefix: String,

    /// Whether to resume the newest uncompressed segment on open
    pub open_mode: OpenMode,

    // -------------------------------------------------------------------------
    // Rotation Configuration
    // -------------------------------------------------------------------------
    /// Rotate the current segment on this interval (None = only on demand)
    pub rotation_interval: Option<Duration>,

    // -------------------------------------------------------------------------
    // Archive Configuration
    // -------------------------------------------------------------------------
    /// Number of background compression threads
    pub compression_workers: usize,

    /// Max retired segments waiting for compression
    pub compression_queue_capacity: usize,

    /// Where decompressed copies of archived segments live while iterated
    /// (None = system temp dir)
    pub scratch_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Iteration Configuration
    // -------------------------------------------------------------------------
    /// Byte budget of one read batch during iteration, in MB
    pub iter_bucket_mb: usize,
}

/// What to do with existing segments on open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Keep appending to the newest uncompressed segment, if there is one
    AppendLatest,

    /// Always start a new segment; the previous one is queued for compression
    CreateNew,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./serialtable_data"),
            prefix: "segment".to_string(),
            open_mode: OpenMode::AppendLatest,
            rotation_interval: None,
            compression_workers: default_compression_workers(),
            compression_queue_capacity: 100,
            scratch_dir: None,
            iter_bucket_mb: DEFAULT_BUCKET_MB,
        }
    }
}

/// A quarter of the available cores, at least one
fn default_compression_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 4)
        .unwrap_or(1)
        .max(1)
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would otherwise fail later and less clearly
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(TableError::Config("prefix must not be empty".to_string()));
        }
        if self.prefix.contains(['.', '/', '\\']) {
            return Err(TableError::Config(format!(
                "prefix {:?} must not contain '.' or path separators",
                self.prefix
            )));
        }
        if self.compression_workers == 0 {
            return Err(TableError::Config(
                "compression_workers must be at least 1".to_string(),
            ));
        }
        if self.compression_queue_capacity == 0 {
            return Err(TableError::Config(
                "compression_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.rotation_interval == Some(Duration::ZERO) {
            return Err(TableError::Config(
                "rotation_interval must be greater than zero".to_string(),
            ));
        }
        if self.iter_bucket_mb == 0 {
            return Err(TableError::Config(
                "iter_bucket_mb must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the segment directory
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the segment filename prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the open mode
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.config.open_mode = mode;
        self
    }

    /// Rotate automatically on this interval
    pub fn rotation_interval(mut self, interval: Duration) -> Self {
        self.config.rotation_interval = Some(interval);
        self
    }

    /// Set the number of compression threads
    pub fn compression_workers(mut self, count: usize) -> Self {
        self.config.compression_workers = count;
        self
    }

    /// Set the compression queue capacity
    pub fn compression_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.compression_queue_capacity = capacity;
        self
    }

    /// Decompress archived segments into this directory while iterating
    pub fn scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(path.into());
        self
    }

    /// Set the iteration batch budget (in MB)
    pub fn iter_bucket_mb(mut self, mb: usize) -> Self {
        self.config.iter_bucket_mb = mb;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
