//! Whole-file gzip helpers
//!
//! Archives are written next to the source under a `.tmp` name, synced, then
//! renamed into place, so a visible `.gz` is always complete.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempPath;

use crate::error::{Result, TableError};

use super::{DECOMPRESSED_SUFFIX, GZ_SUFFIX, PARTIAL_SUFFIX};

/// Compress `path` into `path.gz` and return the archive path
///
/// The source file is left in place; removing it is the caller's decision.
pub fn gzip_file(path: &Path) -> Result<PathBuf> {
    let target = with_suffix(path, GZ_SUFFIX);
    let partial = with_suffix(&target, PARTIAL_SUFFIX);

    if let Err(e) = write_gzip(path, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, &target)
        .map_err(TableError::io(format!("renaming {}", partial.display())))?;
    Ok(target)
}

/// Decompress `src` into `dst`, replacing it; returns the decompressed size
pub fn gunzip_file(src: &Path, dst: &Path) -> Result<u64> {
    let mut output = File::create(dst).map_err(TableError::io(format!("creating {}", dst.display())))?;
    let written = gunzip_into(src, &mut output)?;
    output
        .sync_all()
        .map_err(TableError::io(format!("syncing {}", dst.display())))?;
    Ok(written)
}

/// Decompress `src` into a fresh temporary file
///
/// The file lives in `scratch_dir` (or the system temp dir) and is deleted
/// when the returned path is dropped.
pub fn gunzip_to_temp(src: &Path, scratch_dir: Option<&Path>) -> Result<TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("sbt-").suffix(".decompressed");
    let temp = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(TableError::io("creating scratch file"))?;

    let (mut file, path) = temp.into_parts();
    gunzip_into(src, &mut file)?;
    Ok(path)
}

/// Where a decompressed copy of `archive` goes next to it
///
/// `a/b.sbt.gz` becomes `a/b.sbt.decompressed`, the name discovery reads as
/// the decompressed form of segment `b`. Other names just gain the suffix.
pub fn decompressed_path(archive: &Path) -> PathBuf {
    match archive.to_str().and_then(|name| name.strip_suffix(GZ_SUFFIX)) {
        Some(stem) if !stem.is_empty() => PathBuf::from(format!("{}{}", stem, DECOMPRESSED_SUFFIX)),
        _ => with_suffix(archive, DECOMPRESSED_SUFFIX),
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn write_gzip(src: &Path, dst: &Path) -> Result<()> {
    let input = File::open(src).map_err(TableError::io(format!("opening {}", src.display())))?;
    let output = File::create(dst).map_err(TableError::io(format!("creating {}", dst.display())))?;

    let mut reader = BufReader::new(input);
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut reader, &mut encoder)
        .map_err(TableError::io(format!("compressing {}", src.display())))?;

    let output = encoder
        .finish()
        .and_then(|writer| writer.into_inner().map_err(|e| e.into_error()))
        .map_err(TableError::io(format!("finishing {}", dst.display())))?;
    output
        .sync_all()
        .map_err(TableError::io(format!("syncing {}", dst.display())))?;
    Ok(())
}

fn gunzip_into(src: &Path, output: &mut File) -> Result<u64> {
    let input = File::open(src).map_err(TableError::io(format!("opening {}", src.display())))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut writer = BufWriter::new(output);
    let written = io::copy(&mut decoder, &mut writer)
        .map_err(TableError::io(format!("decompressing {}", src.display())))?;
    io::Write::flush(&mut writer).map_err(TableError::io(format!("decompressing {}", src.display())))?;
    Ok(written)
}

/// `a/b.sbt` + `.gz` = `a/b.sbt.gz`
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
