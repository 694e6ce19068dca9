//! Tests for Container
//!
//! These tests verify:
//! - Creating, appending and reading rows
//! - Persistence across reopen
//! - Header validation (magic, version, hash, schema)
//! - Bounds checking and read-only enforcement
//! - Row count derivation from the file size

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serialtable::container::{fnv1a64, MAGIC, PREAMBLE_SIZE};
use serialtable::{ColumnType, Container, Decoder, Encoder, Result, Row, RowSpec, TableError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Tick {
    symbol: String,
    price: u32,
}

impl Tick {
    fn new(symbol: &str, price: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
        }
    }
}

impl Row for Tick {
    fn columns() -> RowSpec {
        RowSpec::new([
            ColumnType::Str.column_sized("symbol", 8),
            ColumnType::U32.column("price"),
        ])
    }

    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_string_padded(&self.symbol, 8)?;
        enc.encode_u32(self.price)
    }

    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.symbol = dec.decode_string_padded(8)?;
        self.price = dec.decode_u32()?;
        Ok(())
    }
}

/// Same width as Tick, different column names
#[derive(Debug, Default, Clone)]
struct Quote {
    venue: String,
    bid: u32,
}

impl Row for Quote {
    fn columns() -> RowSpec {
        RowSpec::new([
            ColumnType::Str.column_sized("venue", 8),
            ColumnType::U32.column("bid"),
        ])
    }

    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_string_padded(&self.venue, 8)?;
        enc.encode_u32(self.bid)
    }

    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        self.venue = dec.decode_string_padded(8)?;
        self.bid = dec.decode_u32()?;
        Ok(())
    }
}

/// Declares 12 bytes but only writes 8
#[derive(Debug, Default, Clone)]
struct ShortWriter;

impl Row for ShortWriter {
    fn columns() -> RowSpec {
        Tick::columns()
    }

    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_string_padded("short", 8)
    }

    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        dec.decode_string_padded(8)?;
        Ok(())
    }
}

fn setup_temp_container() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ticks.sbt");
    (temp_dir, path)
}

fn schema_len() -> u64 {
    Tick::columns().to_header_bytes().unwrap().len() as u64
}

fn patch_byte(path: &PathBuf, offset: usize, f: impl FnOnce(u8) -> u8) {
    let mut bytes = fs::read(path).unwrap();
    bytes[offset] = f(bytes[offset]);
    fs::write(path, bytes).unwrap();
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_append_and_read() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();

    container.append(&Tick::new("AAPL", 100)).unwrap();
    container.append(&Tick::new("MSFT", 200)).unwrap();

    assert_eq!(container.num_rows(), 2);
    assert_eq!(container.row_size(), 12);
    assert_eq!(container.get(1).unwrap(), Tick::new("MSFT", 200));
    assert_eq!(container.size(), PREAMBLE_SIZE + schema_len() + 2 * 12);

    container.close().unwrap();
    assert_eq!(
        fs::metadata(&path).unwrap().len(),
        PREAMBLE_SIZE + schema_len() + 24
    );
}

#[test]
fn test_new_container_is_header_only() {
    let (_temp, path) = setup_temp_container();
    let container = Container::<Tick>::create(&path).unwrap();

    assert_eq!(container.num_rows(), 0);
    assert_eq!(container.content_offset(), PREAMBLE_SIZE + schema_len());
    assert_eq!(container.version(), 0);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), MAGIC);
    assert_eq!(bytes[2], 0);
    let hash = u64::from_le_bytes(bytes[3..11].try_into().unwrap());
    let len = u32::from_le_bytes(bytes[11..15].try_into().unwrap()) as usize;
    assert_eq!(len as u64, schema_len());
    assert_eq!(hash, fnv1a64(&bytes[15..15 + len]));
    assert_eq!(container.header_hash(), hash);
}

#[test]
fn test_reopen_preserves_rows() {
    let (_temp, path) = setup_temp_container();
    {
        let mut container = Container::<Tick>::create(&path).unwrap();
        container.append(&Tick::new("AAPL", 100)).unwrap();
        container.append(&Tick::new("MSFT", 200)).unwrap();
        container.close().unwrap();
    }

    let mut container = Container::<Tick>::open(&path).unwrap();
    assert_eq!(container.num_rows(), 2);
    assert_eq!(container.get(0).unwrap(), Tick::new("AAPL", 100));

    container.append(&Tick::new("GOOG", 300)).unwrap();
    assert_eq!(container.num_rows(), 3);
    assert_eq!(container.get(2).unwrap(), Tick::new("GOOG", 300));
}

#[test]
fn test_load_creates_then_opens() {
    let (_temp, path) = setup_temp_container();
    {
        let mut container = Container::<Tick>::load(&path).unwrap();
        container.append(&Tick::new("AAPL", 1)).unwrap();
        container.close().unwrap();
    }
    let container = Container::<Tick>::load(&path).unwrap();
    assert_eq!(container.num_rows(), 1);
}

#[test]
fn test_set_overwrites_in_place() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container
        .bulk_append(&[Tick::new("A", 1), Tick::new("B", 2), Tick::new("C", 3)])
        .unwrap();

    container.set(&Tick::new("Z", 26), 1).unwrap();
    container
        .bulk_set(1, &[Tick::new("X", 24), Tick::new("Y", 25)])
        .unwrap();

    assert_eq!(container.num_rows(), 3);
    assert_eq!(container.get(0).unwrap(), Tick::new("A", 1));
    assert_eq!(container.get(1).unwrap(), Tick::new("X", 24));
    assert_eq!(container.get(2).unwrap(), Tick::new("Y", 25));
}

#[test]
fn test_long_symbol_is_truncated() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("VERYLONGSYMBOL", 5)).unwrap();
    assert_eq!(container.get(0).unwrap().symbol, "VERYLONG");
}

// =============================================================================
// Bounds and Modes
// =============================================================================

#[test]
fn test_read_out_of_bounds() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("AAPL", 100)).unwrap();

    let err = container.get(1).unwrap_err();
    assert!(err.is_bounds());

    let err = container.set(&Tick::new("X", 0), 5).unwrap_err();
    assert!(err.is_bounds());

    let err = container
        .bulk_set(0, &[Tick::default(), Tick::default()])
        .unwrap_err();
    assert!(err.is_bounds());

    // Nothing was written
    assert_eq!(container.num_rows(), 1);
}

#[test]
fn test_bulk_read_clamps() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container
        .bulk_append(&[Tick::new("A", 1), Tick::new("B", 2), Tick::new("C", 3)])
        .unwrap();

    let mut slots = vec![Tick::default(); 5];
    assert_eq!(container.bulk_read(1, &mut slots).unwrap(), 2);
    assert_eq!(slots[0], Tick::new("B", 2));
    assert_eq!(slots[1], Tick::new("C", 3));

    assert_eq!(container.bulk_read(3, &mut slots).unwrap(), 0);
    assert!(container.bulk_read(4, &mut slots).unwrap_err().is_bounds());
}

#[test]
fn test_read_only_rejects_writes() {
    let (_temp, path) = setup_temp_container();
    Container::<Tick>::create(&path).unwrap().close().unwrap();

    let mut container = Container::<Tick>::open_read(&path).unwrap();
    assert!(!container.is_writable());
    let err = container.append(&Tick::new("AAPL", 1)).unwrap_err();
    assert!(matches!(err, TableError::State(_)));
}

#[test]
fn test_encode_width_mismatch_is_schema_error() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<ShortWriter>::create(&path).unwrap();
    let err = container.append(&ShortWriter).unwrap_err();
    assert!(matches!(err, TableError::Schema(_)));
    assert_eq!(container.num_rows(), 0);
}

// =============================================================================
// Corruption Detection
// =============================================================================

#[test]
fn test_flipped_schema_byte_fails_hash() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("AAPL", 100)).unwrap();
    container.close().unwrap();

    // First byte of the schema JSON
    patch_byte(&path, PREAMBLE_SIZE as usize, |b| b ^ 0x01);

    let err = Container::<Tick>::open(&path).err().unwrap();
    assert!(err.is_format(), "unexpected error: {}", err);
}

#[test]
fn test_every_header_byte_is_checked() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("AAPL", 100)).unwrap();
    let content_offset = container.content_offset() as usize;
    container.close().unwrap();
    let pristine = fs::read(&path).unwrap();

    for offset in 0..content_offset {
        fs::write(&path, &pristine).unwrap();
        patch_byte(&path, offset, |b| b ^ 0x01);

        let err = Container::<Tick>::open(&path).err();
        assert!(
            err.as_ref().is_some_and(|e| e.is_format()),
            "flip at byte {} gave {:?}",
            offset,
            err
        );
    }
}

#[test]
fn test_bad_magic_rejected() {
    let (_temp, path) = setup_temp_container();
    Container::<Tick>::create(&path).unwrap().close().unwrap();
    patch_byte(&path, 0, |b| b.wrapping_add(1));

    let err = Container::<Tick>::open(&path).err().unwrap();
    assert!(err.is_format());
}

#[test]
fn test_unknown_version_rejected() {
    let (_temp, path) = setup_temp_container();
    Container::<Tick>::create(&path).unwrap().close().unwrap();
    patch_byte(&path, 2, |_| 9);

    let err = Container::<Tick>::open(&path).err().unwrap();
    assert!(err.is_format());
}

#[test]
fn test_short_file_rejected() {
    let (_temp, path) = setup_temp_container();
    fs::write(&path, [0x70, 0x5B, 0]).unwrap();

    let err = Container::<Tick>::open(&path).err().unwrap();
    assert!(err.is_format());
}

#[test]
fn test_partial_trailing_row_rejected() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("AAPL", 100)).unwrap();
    container.close().unwrap();

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);

    let err = Container::<Tick>::open(&path).err().unwrap();
    assert!(err.is_format());
}

#[test]
fn test_schema_mismatch_rejected() {
    let (_temp, path) = setup_temp_container();
    Container::<Tick>::create(&path).unwrap().close().unwrap();

    let err = Container::<Quote>::open(&path).err().unwrap();
    assert!(matches!(err, TableError::SchemaMismatch { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let (_temp, path) = setup_temp_container();
    let err = Container::<Tick>::open(&path).err().unwrap();
    assert!(matches!(err, TableError::IoContext { .. }));
}

// =============================================================================
// Printing
// =============================================================================

#[test]
fn test_print_renders_rows_and_footer() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container
        .bulk_append(&[Tick::new("AAPL", 100), Tick::new("MSFT", 200)])
        .unwrap();

    let mut out = Vec::new();
    container
        .print(&mut out, 0, 10, |t| vec![t.symbol.clone(), t.price.to_string()])
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("symbol (str.8)"));
    assert!(text.contains("AAPL"));
    assert!(text.contains("MSFT"));
    assert!(text.contains("Total"));
}

#[test]
fn test_print_clamps_oversized_count() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("AAPL", 100)).unwrap();

    let mut out = Vec::new();
    container
        .print(&mut out, 0, usize::MAX / 2, |t| vec![t.symbol.clone(), t.price.to_string()])
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("AAPL"));

    // Starting at the end prints only the footer
    let mut out = Vec::new();
    container.print(&mut out, 1, usize::MAX, |t| vec![t.symbol.clone()]).unwrap();
    assert!(!String::from_utf8(out).unwrap().contains("AAPL"));
}

#[test]
fn test_print_past_end_is_bounds_error() {
    let (_temp, path) = setup_temp_container();
    let mut container = Container::<Tick>::create(&path).unwrap();
    container.append(&Tick::new("AAPL", 100)).unwrap();

    let mut out = Vec::new();
    let err = container.print(&mut out, 2, 1, |t| vec![t.symbol.clone()]).err().unwrap();
    assert!(err.is_bounds());
}
